use std::fmt;

/// Maximum number of dimensions for a tensor descriptor
pub const MAX_DIMS: usize = 8; // (N, C, H, W, D, T) + 2 should be enough

/// Supported element types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    I32,
    U32,
}

impl DataType {
    /// Size of one element, in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            DataType::F32 => std::mem::size_of::<f32>(),
            DataType::I32 => std::mem::size_of::<i32>(),
            DataType::U32 => std::mem::size_of::<u32>(),
        }
    }
}

/// Marker‐trait so we can go from T to DataType
pub trait Element: bytemuck::Pod {
    const DTYPE: DataType;
}

impl Element for f32 { const DTYPE: DataType = DataType::F32; }

impl Element for i32 { const DTYPE: DataType = DataType::I32; }

impl Element for u32 { const DTYPE: DataType = DataType::U32; }

/// Device memory layouts a tensor can be negotiated into.
/// `Linear` is the engine default: packed row-major, no vectorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorFormat {
    Linear,
    Chw4,
    Hwc8,
}

/// One dimension of a tensor: either a build-time constant or a symbolic
/// placeholder resolved by the host at execution time. Symbolic dims carry an
/// opaque id so they compare structurally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DimExpr {
    Constant(i64),
    Symbolic(u32),
}

impl DimExpr {
    pub fn is_constant(self) -> bool {
        matches!(self, DimExpr::Constant(_))
    }

    pub fn constant(self) -> Option<i64> {
        match self {
            DimExpr::Constant(v) => Some(v),
            DimExpr::Symbolic(_) => None,
        }
    }
}

impl fmt::Display for DimExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimExpr::Constant(v) => write!(f, "{}", v),
            DimExpr::Symbolic(id) => write!(f, "s{}", id),
        }
    }
}

/// Fixed-capacity dimension list, padded to `MAX_DIMS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims {
    nb_dims: usize,
    d: [DimExpr; MAX_DIMS],
}

impl Dims {
    /// Build from explicit dimension expressions.
    pub fn new(exprs: &[DimExpr]) -> Self {
        assert!(exprs.len() <= MAX_DIMS, "too many dimensions: {}", exprs.len());
        let mut d = [DimExpr::Constant(0); MAX_DIMS];
        d[..exprs.len()].copy_from_slice(exprs);
        Dims { nb_dims: exprs.len(), d }
    }

    /// Build an all-constant shape.
    pub fn constant(shape: &[i64]) -> Self {
        assert!(shape.len() <= MAX_DIMS, "too many dimensions: {}", shape.len());
        let mut d = [DimExpr::Constant(0); MAX_DIMS];
        for (i, &v) in shape.iter().enumerate() {
            d[i] = DimExpr::Constant(v);
        }
        Dims { nb_dims: shape.len(), d }
    }

    pub fn nb_dims(&self) -> usize {
        self.nb_dims
    }

    pub fn expr(&self, index: usize) -> DimExpr {
        assert!(index < self.nb_dims, "dimension index {} out of range", index);
        self.d[index]
    }

    pub fn as_slice(&self) -> &[DimExpr] {
        &self.d[..self.nb_dims]
    }

    /// Total element count, if every dimension is constant.
    pub fn volume(&self) -> Option<i64> {
        self.as_slice().iter().try_fold(1i64, |acc, e| Some(acc * e.constant()?))
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, e) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e)?;
        }
        write!(f, "]")
    }
}

/// Descriptor for one tensor as seen during negotiation and execution:
/// shape, element type, and negotiated memory layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorDesc {
    pub dims: Dims,
    pub dtype: DataType,
    pub format: TensorFormat,
}

/// Build-time descriptor: the tensor as configured, plus the host's bounds
/// for any symbolic dimensions (all-constant shapes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynamicTensorDesc {
    pub desc: TensorDesc,
    pub min: Dims,
    pub max: Dims,
}

/* ------------------------------------------------------------------------- */
/*                                     Tests                                 */
/* ------------------------------------------------------------------------- */
