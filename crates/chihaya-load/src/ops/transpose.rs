use crate::{Decoder, Error, Matrix, engine::MatrixEngine, node::Node, read};

pub(crate) fn load<E: MatrixEngine>(
    decoder: &Decoder<E>,
    node: &dyn Node,
) -> Result<Matrix<E>, Error> {
    let permutation = read::indices(node, "permutation")?;
    let swap = match permutation.as_slice() {
        [0, 1] => false,
        [1, 0] => true,
        _ => {
            return Err(Error::malformed(
                node.path(),
                "permutation",
                format!("expected a permutation of [0, 1], got {:?}", permutation),
            ));
        }
    };

    let seed = read::seed(decoder, node)?;
    if !swap {
        return Ok(seed);
    }
    decoder.adopt(node, decoder.engine().transpose(seed.handle()))
}
