use itertools::Itertools;
use tracing::warn;

use crate::{
    Decoder, Error, Matrix,
    engine::{Axis, MatrixEngine},
    node::Node,
    read::{self, List},
};

/// Binds the `seeds` list along `along` (0 binds rows, 1 binds columns).
///
/// Seeds are decoded in list order. If one fails, the seeds decoded before it
/// are released before the error is returned; after the bind every seed is
/// released whether it succeeded or not.
pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let along = read::scalar_i64(node, "along")?;
    let axis = match Axis::from_index(along) {
        Some(axis) => axis,
        None if decoder.options().lenient_along => {
            warn!(path = node.path(), along, "treating unrecognized 'along' as a column bind");
            Axis::Column
        }
        None => {
            return Err(Error::malformed(
                node.path(),
                "along",
                format!("expected 0 or 1, got {}", along),
            ));
        }
    };

    let list = List::require(node, "seeds")?;
    if list.len() == 0 {
        return Err(Error::malformed(node.path(), "seeds", "expected at least one seed"));
    }

    let seeds = (0..list.len())
        .map(|i| {
            let seed = list.group(i).ok_or_else(|| {
                Error::malformed(list.path(), i.to_string(), "expected a seed group")
            })?;
            decoder.decode(seed.as_ref())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let handles = seeds.iter().map(Matrix::handle).collect_vec();
    let combined = match axis {
        Axis::Row => decoder.engine().row_bind(&handles),
        Axis::Column => decoder.engine().col_bind(&handles),
    };
    decoder.adopt(node, combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ErrorKind,
        engine::DenseMatrix,
        node::Group,
        ops::test_util::{broken, decoder, dense, operation},
    };
    use rstest::rstest;

    fn combine(along: i64, seeds: Vec<Group>) -> Group {
        let list = seeds
            .into_iter()
            .enumerate()
            .fold(Group::new().with_attribute("delayed_length", 0_i64), |list, (i, seed)| {
                list.with_attribute("delayed_length", i as i64 + 1)
                    .with_group(&i.to_string(), seed)
            });
        operation("combine").with_dataset("along", along).with_group("seeds", list)
    }

    #[rstest]
    #[case::rows(0, DenseMatrix::new(2, 2, vec![1.0, 3.0, 2.0, 4.0]))]
    #[case::columns(1, DenseMatrix::new(1, 4, vec![1.0, 2.0, 3.0, 4.0]))]
    fn test_combine(#[case] along: i64, #[case] expected: DenseMatrix) {
        let decoder = decoder();
        let group = combine(along, vec![dense(1, 2, vec![1.0, 2.0]), dense(1, 2, vec![3.0, 4.0])]);
        let matrix = decoder.decode(&group.as_node()).unwrap();

        assert_eq!(decoder.engine().to_dense(matrix.handle()), Some(expected));
        assert_eq!(decoder.engine().live_handles(), 1);
    }

    #[test]
    fn test_seed_failure_releases_decoded_seeds() {
        let decoder = decoder();
        let group = combine(
            0,
            vec![
                dense(1, 1, vec![1.0]),
                dense(1, 1, vec![2.0]),
                broken(),
                dense(1, 1, vec![4.0]),
            ],
        );
        let err = decoder.decode(&group.as_node()).unwrap_err();

        assert_eq!(err.path, "/seeds/2");
        assert_eq!(decoder.engine().created(), 2);
        assert_eq!(decoder.engine().live_handles(), 0);
    }

    #[test]
    fn test_bind_failure_releases_seeds() {
        let decoder = decoder();
        let group = combine(0, vec![dense(1, 2, vec![1.0, 2.0]), dense(1, 3, vec![3.0, 4.0, 5.0])]);
        let err = decoder.decode(&group.as_node()).unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Engine(_)));
        assert_eq!(err.path, "/");
        assert_eq!(decoder.engine().live_handles(), 0);
    }

    #[rstest]
    #[case::strict(false, Err(()))]
    #[case::lenient(true, Ok((1, 2)))]
    fn test_unrecognized_along(
        #[case] lenient: bool,
        #[case] expected: Result<(usize, usize), ()>,
    ) {
        let mut decoder = decoder();
        decoder.set_lenient_along(lenient);
        let group = combine(2, vec![dense(1, 1, vec![1.0]), dense(1, 1, vec![2.0])]);

        let result = decoder.decode(&group.as_node()).map(|m| m.shape()).map_err(|_| ());
        assert_eq!(result, expected);
        assert_eq!(decoder.engine().live_handles(), 0);
    }

    #[rstest]
    #[case::missing_along(operation("combine").with_group("seeds", Group::new()), "along")]
    #[case::string_along(operation("combine").with_dataset("along", "0"), "along")]
    #[case::missing_seeds(operation("combine").with_dataset("along", 0_i64), "seeds")]
    #[case::empty_seeds(combine(0, Vec::new()), "seeds")]
    #[case::hole_in_seeds(
        operation("combine")
            .with_dataset("along", 0_i64)
            .with_group(
                "seeds",
                Group::new()
                    .with_attribute("delayed_length", 2_i64)
                    .with_group("1", dense(1, 1, vec![1.0])),
            ),
        "0"
    )]
    fn test_malformed(#[case] group: Group, #[case] expected_field: &str) {
        let decoder = decoder();
        let err = decoder.decode(&group.as_node()).unwrap_err();

        match err.kind {
            ErrorKind::MalformedOperand { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(decoder.engine().live_handles(), 0);
    }
}
