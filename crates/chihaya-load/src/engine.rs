//! The numeric engine the decoder drives.
//!
//! The decoder never does matrix arithmetic itself. It reads operands from the
//! serialized tree, turns them into the typed descriptions below and hands them
//! to a [`MatrixEngine`], which owns the resulting native handles.
use std::fmt;

/// Dimension of a matrix. `Row` is dimension 0, `Column` is dimension 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Axis::Row),
            1 => Some(Axis::Column),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::Row => 0,
            Axis::Column => 1,
        }
    }

    /// Extent of a `(nrow, ncol)` shape along this axis.
    pub fn extent(self, shape: (usize, usize)) -> usize {
        match self {
            Axis::Row => shape.0,
            Axis::Column => shape.1,
        }
    }
}

/// Column-major dense payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    pub nrow: usize,
    pub ncol: usize,
    pub values: Vec<f64>,
}

impl DenseMatrix {
    pub fn new(nrow: usize, ncol: usize, values: Vec<f64>) -> Self {
        Self { nrow, ncol, values }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[col * self.nrow + row]
    }
}

/// Compressed sparse column payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    pub nrow: usize,
    pub ncol: usize,
    pub values: Vec<f64>,
    /// Row index of each stored value.
    pub indices: Vec<usize>,
    /// `indptr[c]..indptr[c + 1]` are the stored values of column `c`.
    pub indptr: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Modulo,
    IntegerDivide,
}

impl ArithOp {
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "+" => Some(ArithOp::Add),
            "-" => Some(ArithOp::Subtract),
            "*" => Some(ArithOp::Multiply),
            "/" => Some(ArithOp::Divide),
            "^" => Some(ArithOp::Power),
            "%%" => Some(ArithOp::Modulo),
            "%/%" => Some(ArithOp::IntegerDivide),
            _ => None,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Subtract => lhs - rhs,
            ArithOp::Multiply => lhs * rhs,
            ArithOp::Divide => lhs / rhs,
            ArithOp::Power => lhs.powf(rhs),
            ArithOp::Modulo => lhs - (lhs / rhs).floor() * rhs,
            ArithOp::IntegerDivide => (lhs / rhs).floor(),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Power => "^",
            ArithOp::Modulo => "%%",
            ArithOp::IntegerDivide => "%/%",
        };
        write!(f, "{}", s)
    }
}

/// Which side of the operator the matrix sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `operand <op> matrix`
    Left,
    /// `matrix <op> operand`
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(f64),
    /// One value per row (`Axis::Row`) or per column (`Axis::Column`).
    Vector { along: Axis, values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arithmetic {
    /// Unary `+x` or `-x`.
    Unary(ArithOp),
    Binary { op: ArithOp, side: Side, operand: Operand },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Math {
    Abs,
    Sign,
    Sqrt,
    Exp,
    Expm1,
    Log { base: Option<f64> },
    Log1p,
    Log2,
    Log10,
    Ceiling,
    Floor,
    Trunc,
    Round { digits: i32 },
    Signif { digits: i32 },
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
}

impl Math {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Math::Abs => x.abs(),
            Math::Sign => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    x
                }
            }
            Math::Sqrt => x.sqrt(),
            Math::Exp => x.exp(),
            Math::Expm1 => x.exp_m1(),
            Math::Log { base: None } => x.ln(),
            Math::Log { base: Some(base) } => x.log(base),
            Math::Log1p => x.ln_1p(),
            Math::Log2 => x.log2(),
            Math::Log10 => x.log10(),
            Math::Ceiling => x.ceil(),
            Math::Floor => x.floor(),
            Math::Trunc => x.trunc(),
            Math::Round { digits } => round_scaled(x, digits),
            Math::Signif { digits } => {
                if x == 0.0 || !x.is_finite() {
                    return x;
                }
                let magnitude = x.abs().log10().floor() as i32;
                round_scaled(x, digits.max(1) - 1 - magnitude)
            }
            Math::Sin => x.sin(),
            Math::Cos => x.cos(),
            Math::Tan => x.tan(),
            Math::Asin => x.asin(),
            Math::Acos => x.acos(),
            Math::Atan => x.atan(),
            Math::Sinh => x.sinh(),
            Math::Cosh => x.cosh(),
            Math::Tanh => x.tanh(),
            Math::Asinh => x.asinh(),
            Math::Acosh => x.acosh(),
            Math::Atanh => x.atanh(),
        }
    }
}

/// Rounds `x` to `digits` decimal places; negative `digits` round to tens, hundreds, ...
fn round_scaled(x: f64, digits: i32) -> f64 {
    if digits >= 0 {
        let scale = 10_f64.powi(digits);
        (x * scale).round() / scale
    } else {
        let scale = 10_f64.powi(-digits);
        (x / scale).round() * scale
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimnames {
    pub rows: Option<Vec<String>>,
    pub cols: Option<Vec<String>>,
}

impl Dimnames {
    pub fn is_empty(&self) -> bool {
        self.rows.is_none() && self.cols.is_none()
    }
}

/// Builds and combines native matrix handles.
///
/// Every handle returned by a constructor must eventually be passed to
/// [`MatrixEngine::release`] exactly once. Operations borrow their inputs and
/// never take ownership of them.
pub trait MatrixEngine {
    type Handle;
    type Error: std::error::Error + Send + Sync + 'static;

    fn dense(&self, matrix: DenseMatrix) -> Result<Self::Handle, Self::Error>;

    fn sparse(&self, matrix: SparseMatrix) -> Result<Self::Handle, Self::Error>;

    /// `(nrow, ncol)` of a live handle.
    fn shape(&self, handle: &Self::Handle) -> (usize, usize);

    fn row_bind(&self, seeds: &[&Self::Handle]) -> Result<Self::Handle, Self::Error>;

    fn col_bind(&self, seeds: &[&Self::Handle]) -> Result<Self::Handle, Self::Error>;

    fn transpose(&self, seed: &Self::Handle) -> Result<Self::Handle, Self::Error>;

    fn subset(
        &self,
        seed: &Self::Handle,
        axis: Axis,
        indices: &[usize],
    ) -> Result<Self::Handle, Self::Error>;

    fn unary_arith(
        &self,
        seed: &Self::Handle,
        op: &Arithmetic,
    ) -> Result<Self::Handle, Self::Error>;

    fn unary_math(&self, seed: &Self::Handle, op: Math) -> Result<Self::Handle, Self::Error>;

    fn attach_dimnames(
        &self,
        seed: &Self::Handle,
        names: &Dimnames,
    ) -> Result<Self::Handle, Self::Error>;

    fn release(&self, handle: Self::Handle);
}
