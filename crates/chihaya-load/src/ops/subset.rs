use crate::{
    Decoder, Error, Matrix,
    engine::{Axis, MatrixEngine},
    node::Node,
    read::{self, List},
};

/// Subsets the seed by the optional 0-based index vectors in the `index` list.
pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let list = List::require(node, "index")?;
    if list.len() != 2 {
        return Err(Error::malformed(
            node.path(),
            "index",
            format!("expected 2 entries, got {}", list.len()),
        ));
    }

    let selections = [Axis::Row, Axis::Column]
        .into_iter()
        .map(|axis| {
            let Some(value) = list.dataset(axis.index()) else {
                return Ok((axis, None));
            };
            value
                .to_i64s()
                .and_then(|v| {
                    v.into_iter()
                        .map(|i| usize::try_from(i).ok())
                        .collect::<Option<Vec<_>>>()
                })
                .map(|indices| (axis, Some(indices)))
                .ok_or_else(|| {
                    Error::malformed(
                        node.path(),
                        "index",
                        format!("entry {} should hold non-negative integers", axis.index()),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut current = read::seed(decoder, node)?;
    let shape = current.shape();

    for (axis, indices) in selections {
        let Some(indices) = indices else {
            continue;
        };
        let extent = axis.extent(shape);
        if let Some(index) = indices.iter().find(|i| **i >= extent) {
            return Err(Error::malformed(
                node.path(),
                "index",
                format!(
                    "index {} out of range for dimension {} of extent {}",
                    index,
                    axis.index(),
                    extent
                ),
            ));
        }
        current = decoder.adopt(node, decoder.engine().subset(current.handle(), axis, &indices))?;
    }

    Ok(current)
}
