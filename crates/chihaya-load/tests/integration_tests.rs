use std::{cell::Cell, rc::Rc};

use chihaya_load::{
    Decoder, ErrorKind, Group, Kind, Matrix, MatrixEngine,
    dense::DenseEngine,
    engine::{DenseMatrix, Dimnames},
};
use chihaya_test::{
    create_file, defer,
    fixtures::{container, dense, list, operation, sparse},
};
use miette::Diagnostic;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn decoder() -> Decoder<DenseEngine> {
    Decoder::new(Rc::new(DenseEngine::new()))
}

fn decode(
    decoder: &Decoder<DenseEngine>,
    node: Value,
) -> Result<Matrix<DenseEngine>, chihaya_load::Error> {
    let root = Group::from_json(&json!({ "matrix": node })).unwrap();
    let group = root.find("matrix").unwrap();
    decoder.decode(&group.at("/matrix"))
}

fn values(decoder: &Decoder<DenseEngine>, matrix: &Matrix<DenseEngine>) -> DenseMatrix {
    decoder.engine().to_dense(matrix.handle()).unwrap()
}

fn combine(along: i64, seeds: Vec<Value>) -> Value {
    operation("combine", json!({ "along": along, "seeds": list(seeds) }))
}

#[rstest]
#[case::dense(
    dense(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]),
    DenseMatrix::new(2, 3, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0])
)]
#[case::sparse(
    sparse((3, 2), &[1.0, 2.0, 3.0], &[0, 2, 1], &[0, 2, 3]),
    DenseMatrix::new(3, 2, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0])
)]
#[case::transposed(
    operation("transpose", json!({ "permutation": [1, 0], "seed": dense(&[&[1.0, 2.0, 3.0]]) })),
    DenseMatrix::new(3, 1, vec![1.0, 2.0, 3.0])
)]
#[case::nested(
    operation("subset", json!({
        "index": list(vec![json!([1]), json!([0])]),
        "seed": operation("unary arithmetic", json!({
            "method": "*",
            "side": "right",
            "value": 10,
            "seed": combine(0, vec![dense(&[&[1.0, 2.0]]), dense(&[&[3.0, 4.0]])]),
        })),
    })),
    DenseMatrix::new(1, 1, vec![30.0])
)]
#[case::math_after_combine(
    operation("unary math", json!({
        "method": "sqrt",
        "seed": combine(1, vec![dense(&[&[4.0]]), dense(&[&[9.0]])]),
    })),
    DenseMatrix::new(1, 2, vec![2.0, 3.0])
)]
fn test_decode(decoder: Decoder<DenseEngine>, #[case] node: Value, #[case] expected: DenseMatrix) {
    let matrix = decode(&decoder, node).unwrap();

    assert_eq!(values(&decoder, &matrix), expected);
    assert_eq!(decoder.engine().live_handles(), 1);
    drop(matrix);
    assert_eq!(decoder.engine().live_handles(), 0);
}

#[rstest]
fn test_combine_is_order_sensitive(decoder: Decoder<DenseEngine>) {
    let a = dense(&[&[1.0, 2.0]]);
    let b = dense(&[&[3.0, 4.0]]);

    let ab = decode(&decoder, combine(0, vec![a.clone(), b.clone()])).unwrap();
    let ba = decode(&decoder, combine(0, vec![b, a])).unwrap();

    assert_eq!(ab.shape(), (2, 2));
    assert_eq!(ba.shape(), (2, 2));
    assert_ne!(values(&decoder, &ab), values(&decoder, &ba));
}

#[rstest]
fn test_single_seed_combine_matches_seed(decoder: Decoder<DenseEngine>) {
    let seed = dense(&[&[1.0, 2.0], &[3.0, 4.0]]);

    let combined = decode(&decoder, combine(1, vec![seed.clone()])).unwrap();
    let plain = decode(&decoder, seed).unwrap();

    assert_eq!(values(&decoder, &combined), values(&decoder, &plain));
}

#[rstest]
fn test_failed_seed_releases_earlier_seeds(decoder: Decoder<DenseEngine>) {
    let unsupported = json!({
        "attributes": { "delayed_type": "array", "delayed_array": "external hdf5 dense array" },
    });
    let node = combine(
        0,
        vec![dense(&[&[1.0]]), dense(&[&[2.0]]), unsupported, dense(&[&[4.0]])],
    );
    let err = decode(&decoder, node).unwrap_err();

    assert_eq!(err.path, "/matrix/seeds/2");
    assert!(matches!(
        err.kind,
        ErrorKind::UnsupportedArrayType(ref name) if name == "external hdf5 dense array"
    ));
    assert_eq!(decoder.engine().created(), 2);
    assert_eq!(decoder.engine().released(), 2);
    assert_eq!(decoder.engine().live_handles(), 0);
}

#[rstest]
#[case::unsupported_operation(
    operation("frobnicate", json!({ "seed": dense(&[&[1.0]]) })),
    "chihaya::unsupported_operation"
)]
#[case::missing_operation(
    json!({ "attributes": { "delayed_type": "operation" }, "seed": dense(&[&[1.0]]) }),
    "chihaya::missing_operation_attribute"
)]
#[case::malformed_leaf(
    json!({ "attributes": { "delayed_type": "array", "delayed_array": "dense array" } }),
    "chihaya::malformed_array"
)]
fn test_errors_leave_no_live_handles(
    decoder: Decoder<DenseEngine>,
    #[case] node: Value,
    #[case] expected_code: &str,
) {
    let err = decode(&decoder, node).unwrap_err();

    assert_eq!(err.code().map(|c| c.to_string()), Some(expected_code.to_string()));
    assert_eq!(err.path, "/matrix");
    assert_eq!(decoder.engine().live_handles(), 0);
}

#[rstest]
fn test_unsupported_operation_names_the_operation(decoder: Decoder<DenseEngine>) {
    let err = decode(&decoder, operation("frobnicate", json!({}))).unwrap_err();

    assert!(matches!(err.kind, ErrorKind::UnsupportedOperation(ref name) if name == "frobnicate"));
    assert!(err.to_string().contains("frobnicate"));
}

#[rstest]
fn test_override_takes_precedence(mut decoder: Decoder<DenseEngine>) {
    let calls = Rc::new(Cell::new(0));
    let recorded = Rc::clone(&calls);
    decoder.register_override(Kind::Operation, "transpose", move |decoder, node| {
        recorded.set(recorded.get() + 1);
        let seed = node.group("seed").expect("transpose without a seed");
        decoder.decode(seed.as_ref())
    });

    let node = operation(
        "transpose",
        json!({ "permutation": [1, 0], "seed": dense(&[&[1.0, 2.0, 3.0]]) }),
    );
    let matrix = decode(&decoder, node).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(matrix.shape(), (1, 3));
}

#[rstest]
fn test_override_adds_operation(mut decoder: Decoder<DenseEngine>) {
    decoder.register_override(Kind::Operation, "frobnicate", |decoder, node| {
        decoder.decode(node.group("seed").expect("frobnicate without a seed").as_ref())
    });

    let frobnicate = || operation("frobnicate", json!({ "seed": dense(&[&[1.0]]) }));
    let matrix = decode(&decoder, frobnicate()).unwrap();
    assert_eq!(matrix.shape(), (1, 1));

    decoder.registry_mut().unregister(Kind::Operation, "frobnicate");
    drop(matrix);
    let err = decode(&decoder, frobnicate()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedOperation(_)));
    assert_eq!(decoder.engine().live_handles(), 0);
}

#[rstest]
fn test_array_override(mut decoder: Decoder<DenseEngine>) {
    decoder.register_override(Kind::Array, "constant array", |decoder, node| {
        decoder.adopt(node, decoder.engine().dense(DenseMatrix::new(2, 2, vec![7.0; 4])))
    });

    let node = json!({
        "attributes": { "delayed_type": "array", "delayed_array": "constant array" }
    });
    let matrix = decode(&decoder, node).unwrap();

    assert_eq!(values(&decoder, &matrix), DenseMatrix::new(2, 2, vec![7.0; 4]));
}

#[rstest]
fn test_dimnames_flow_through_operations(decoder: Decoder<DenseEngine>) {
    let node = operation(
        "dimnames",
        json!({
            "dimnames": list(vec![json!(["a", "b"]), json!(["x", "y", "z"])]),
            "seed": dense(&[&[1.0], &[2.0]]),
        }),
    );
    let err = decode(&decoder, node).unwrap_err();

    assert!(matches!(
        err.kind,
        ErrorKind::MalformedOperand { ref field, .. } if field == "dimnames"
    ));
    assert_eq!(decoder.engine().live_handles(), 0);

    let node = operation(
        "transpose",
        json!({
            "permutation": [1, 0],
            "seed": operation("dimnames", json!({
                "dimnames": {
                    "attributes": { "delayed_length": 2 },
                    "0": ["a", "b"],
                },
                "seed": dense(&[&[1.0], &[2.0]]),
            })),
        }),
    );
    let matrix = decode(&decoder, node).unwrap();

    assert_eq!(
        decoder.engine().dimnames(matrix.handle()),
        Some(Dimnames {
            rows: None,
            cols: Some(vec!["a".to_string(), "b".to_string()]),
        })
    );
}

#[rstest]
#[case::within_limit(3, true)]
#[case::over_limit(2, false)]
fn test_max_depth(mut decoder: Decoder<DenseEngine>, #[case] max_depth: u32, #[case] ok: bool) {
    decoder.set_max_depth(max_depth);
    let node = operation(
        "transpose",
        json!({
            "permutation": [1, 0],
            "seed": operation(
                "transpose",
                json!({ "permutation": [1, 0], "seed": dense(&[&[1.0, 2.0]]) }),
            ),
        }),
    );

    match decode(&decoder, node) {
        Ok(matrix) => {
            assert!(ok);
            assert_eq!(matrix.shape(), (1, 2));
        }
        Err(err) => {
            assert!(!ok);
            assert!(matches!(err.kind, ErrorKind::MaxDepthExceeded(2)));
            assert_eq!(err.path, "/matrix/seed/seed");
        }
    }
    assert!(decoder.engine().live_handles() <= 1);
}

#[rstest]
fn test_decode_from_path(decoder: Decoder<DenseEngine>) {
    let content = container(
        "matrix",
        operation("transpose", json!({ "permutation": [1, 0], "seed": dense(&[&[1.0, 2.0]]) })),
    );
    let path = create_file("test_decode_from_path", &content);
    let path_clone = path.clone();

    defer! {
        if path_clone.exists() {
            std::fs::remove_file(&path_clone).expect("Failed to delete temp file");
        }
    }

    let matrix = decoder.decode_from_path(&path, "matrix").unwrap();
    assert_eq!(values(&decoder, &matrix), DenseMatrix::new(2, 1, vec![1.0, 2.0]));

    let err = decoder.decode_from_path(&path, "missing").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::GroupNotFound(ref name) if name == "missing"));
    assert_eq!(err.path, path.display().to_string());

    let engine = Rc::new(DenseEngine::new());
    let matrix = chihaya_load::decode_from_path(&path, "/matrix", Rc::clone(&engine)).unwrap();
    assert_eq!(matrix.shape(), (2, 1));
    drop(matrix);
    assert_eq!(engine.live_handles(), 0);
}

#[rstest]
#[case::not_json("not json", "chihaya::json")]
#[case::not_an_object("[1, 2]", "chihaya::invalid_container")]
fn test_decode_from_path_rejects_bad_containers(
    decoder: Decoder<DenseEngine>,
    #[case] content: &str,
    #[case] expected_code: &str,
) {
    let path = create_file("test_bad_container", content);
    let path_clone = path.clone();

    defer! {
        if path_clone.exists() {
            std::fs::remove_file(&path_clone).expect("Failed to delete temp file");
        }
    }

    let err = decoder.decode_from_path(&path, "matrix").unwrap_err();
    assert_eq!(err.code().map(|c| c.to_string()), Some(expected_code.to_string()));
}

#[rstest]
fn test_decode_from_missing_file(decoder: Decoder<DenseEngine>) {
    let err = decoder
        .decode_from_path("/nonexistent/chihaya/container.json", "matrix")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io(_)));
}
