use crate::{
    Decoder, Error, Matrix,
    engine::{ArithOp, Arithmetic, MatrixEngine, Operand, Side},
    node::Node,
    read,
};

pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let method = read::scalar_string(node, "method")?;
    let op = ArithOp::from_method(&method).ok_or_else(|| {
        Error::malformed(
            node.path(),
            "method",
            format!("unknown arithmetic method \"{}\"", method),
        )
    })?;

    let side = read::scalar_string(node, "side")?;
    let arithmetic = match side.as_str() {
        "none" if matches!(op, ArithOp::Add | ArithOp::Subtract) => Arithmetic::Unary(op),
        "none" => {
            return Err(Error::malformed(
                node.path(),
                "side",
                format!("method \"{}\" needs an operand", op),
            ));
        }
        "left" | "right" => Arithmetic::Binary {
            op,
            side: if side.as_str() == "left" { Side::Left } else { Side::Right },
            operand: operand(node)?,
        },
        other => {
            return Err(Error::malformed(
                node.path(),
                "side",
                format!("expected \"left\", \"right\" or \"none\", got \"{}\"", other),
            ));
        }
    };

    let seed = read::seed(decoder, node)?;
    if let Arithmetic::Binary {
        operand: Operand::Vector { along, values },
        ..
    } = &arithmetic
    {
        let extent = along.extent(seed.shape());
        if values.len() != extent {
            return Err(Error::malformed(
                node.path(),
                "value",
                format!(
                    "{} values along dimension {} of extent {}",
                    values.len(),
                    along.index(),
                    extent
                ),
            ));
        }
    }

    decoder.adopt(node, decoder.engine().unary_arith(seed.handle(), &arithmetic))
}

fn operand(node: &dyn Node) -> Result<Operand, Error> {
    let value = read::dataset(node, "value")?;
    let values = value
        .to_f64s()
        .ok_or_else(|| Error::malformed(node.path(), "value", "expected numeric values"))?;

    if value.is_scalar()
        && let Some(scalar) = values.first()
    {
        return Ok(Operand::Scalar(*scalar));
    }
    Ok(Operand::Vector {
        along: read::axis(node, "along")?,
        values,
    })
}
