use crate::{
    Decoder, Error, Matrix,
    engine::{Math, MatrixEngine},
    node::Node,
    read,
};

fn parse_method(node: &dyn Node, method: &str) -> Result<Math, Error> {
    let math = match method {
        "abs" => Math::Abs,
        "sign" => Math::Sign,
        "sqrt" => Math::Sqrt,
        "exp" => Math::Exp,
        "expm1" => Math::Expm1,
        "log" => Math::Log {
            base: read::optional_f64(node, "base")?,
        },
        "log1p" => Math::Log1p,
        "log2" => Math::Log2,
        "log10" => Math::Log10,
        "ceiling" => Math::Ceiling,
        "floor" => Math::Floor,
        "trunc" => Math::Trunc,
        "round" => Math::Round {
            digits: digits(node, 0)?,
        },
        "signif" => Math::Signif {
            digits: digits(node, 6)?,
        },
        "sin" => Math::Sin,
        "cos" => Math::Cos,
        "tan" => Math::Tan,
        "asin" => Math::Asin,
        "acos" => Math::Acos,
        "atan" => Math::Atan,
        "sinh" => Math::Sinh,
        "cosh" => Math::Cosh,
        "tanh" => Math::Tanh,
        "asinh" => Math::Asinh,
        "acosh" => Math::Acosh,
        "atanh" => Math::Atanh,
        _ => {
            return Err(Error::malformed(
                node.path(),
                "method",
                format!("unknown math method \"{}\"", method),
            ));
        }
    };
    Ok(math)
}

fn digits(node: &dyn Node, default: i32) -> Result<i32, Error> {
    match read::optional_i64(node, "digits")? {
        Some(d) => i32::try_from(d)
            .map_err(|_| Error::malformed(node.path(), "digits", "out of range")),
        None => Ok(default),
    }
}

pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let method = read::scalar_string(node, "method")?;
    let math = parse_method(node, &method)?;

    let seed = read::seed(decoder, node)?;
    decoder.adopt(node, decoder.engine().unary_math(seed.handle(), math))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ErrorKind,
        node::Group,
        ops::test_util::{decoder, dense, operation},
    };
    use rstest::rstest;

    fn math(method: &str) -> Group {
        operation("unary math")
            .with_dataset("method", method)
            .with_group("seed", dense(1, 3, vec![1.0, 4.0, 100.0]))
    }

    #[rstest]
    #[case::sqrt(math("sqrt"), vec![1.0, 2.0, 10.0])]
    #[case::log10(math("log10"), vec![0.0, 4.0_f64.log10(), 2.0])]
    #[case::log_base(math("log").with_dataset("base", 2.0), vec![0.0, 2.0, 100.0_f64.log2()])]
    #[case::round(math("round").with_dataset("digits", -1_i64), vec![0.0, 0.0, 100.0])]
    #[case::signif(math("signif").with_dataset("digits", 1_i64), vec![1.0, 4.0, 100.0])]
    fn test_unary_math(#[case] group: Group, #[case] expected: Vec<f64>) {
        let decoder = decoder();
        let matrix = decoder.decode(&group.as_node()).unwrap();
        let values = decoder.engine().to_dense(matrix.handle()).unwrap().values;

        for (got, want) in values.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
        assert_eq!(decoder.engine().live_handles(), 1);
    }

    #[rstest]
    #[case::unknown(math("gamma"), "method")]
    #[case::string_base(math("log").with_dataset("base", "e"), "base")]
    #[case::fractional_digits(math("round").with_dataset("digits", 1.5), "digits")]
    #[case::missing_method(
        operation("unary math").with_group("seed", dense(1, 1, vec![1.0])),
        "method"
    )]
    fn test_malformed(#[case] group: Group, #[case] expected_field: &str) {
        let decoder = decoder();
        let err = decoder.decode(&group.as_node()).unwrap_err();

        match err.kind {
            ErrorKind::MalformedOperand { field, .. } => assert_eq!(field, expected_field),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(decoder.engine().created(), 0);
    }
}
