use crate::{Decoder, Error, Matrix, engine::MatrixEngine, node::Node, read};

/// Replaces the seed's dimnames. An absent entry clears the names on that axis.
pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let names = read::dimnames(node, "dimnames")?
        .ok_or_else(|| Error::malformed(node.path(), "dimnames", "expected a list group"))?;

    let seed = read::seed(decoder, node)?;
    read::check_dimnames(node, "dimnames", &names, seed.shape())?;
    decoder.adopt(node, decoder.engine().attach_dimnames(seed.handle(), &names))
}
