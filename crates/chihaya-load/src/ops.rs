//! Built-in reconstructors, one per delayed operation.
//!
//! Each reads its operands first, then decodes its seed(s), and returns one
//! new matrix. Seeds are owned as [`crate::Matrix`] guards, so they are
//! released on every exit path.
pub(crate) mod combine;
pub(crate) mod dimnames;
pub(crate) mod subset;
pub(crate) mod transpose;
pub(crate) mod unary_arith;
pub(crate) mod unary_math;

#[cfg(test)]
pub(crate) mod test_util {
    use std::rc::Rc;

    use crate::{
        Decoder,
        dense::DenseEngine,
        node::{Data, Group, Value},
    };

    pub fn decoder() -> Decoder<DenseEngine> {
        Decoder::new(Rc::new(DenseEngine::new()))
    }

    /// A native dense leaf with `nrow * ncol` values given row by row.
    pub fn dense(nrow: usize, ncol: usize, rows: Vec<f64>) -> Group {
        Group::new()
            .with_attribute("delayed_type", "array")
            .with_attribute("delayed_array", "dense array")
            .with_dataset("data", Value::matrix(nrow, ncol, Data::Float(rows)))
            .with_dataset("native", true)
    }

    pub fn operation(name: &str) -> Group {
        Group::new()
            .with_attribute("delayed_type", "operation")
            .with_attribute("delayed_operation", name)
    }

    /// A leaf whose payload is rejected by the loader.
    pub fn broken() -> Group {
        Group::new()
            .with_attribute("delayed_type", "array")
            .with_attribute("delayed_array", "dense array")
    }
}
