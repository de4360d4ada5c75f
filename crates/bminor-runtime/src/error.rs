//! Fault taxonomy and error types for runtime operations

use derive_more::{Display, Error};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// The closed set of faults the runtime can detect.
///
/// Each kind maps to a fixed process exit status, used when a fault is
/// reported across the C ABI.
#[repr(i32)]
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    #[display("allocation failure")]
    AllocationFailure = 1,

    #[display("invalid array size")]
    InvalidArraySize = 2,

    #[display("array size mismatch")]
    ArraySizeMismatch = 3,

    #[display("index out of bounds")]
    IndexOutOfBounds = 4,

    #[display("null array access")]
    NullArrayAccess = 5,
}

impl FaultKind {
    pub const ALL: [FaultKind; 5] = [
        FaultKind::AllocationFailure,
        FaultKind::InvalidArraySize,
        FaultKind::ArraySizeMismatch,
        FaultKind::IndexOutOfBounds,
        FaultKind::NullArrayAccess,
    ];

    /// Exit status used when this fault terminates the process.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

/// A detected invariant violation.
#[derive(Display, Debug, Clone, PartialEq, Eq, Error)]
#[display("{message}")]
pub struct RuntimeError {
    kind: FaultKind,
    message: String,
}

impl RuntimeError {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn allocation_failure(bytes: usize) -> Self {
        Self::new(
            FaultKind::AllocationFailure,
            format!("Memory allocation failed ({bytes} bytes)"),
        )
    }

    pub(crate) fn size_overflow(length: usize, element_size: usize) -> Self {
        Self::new(
            FaultKind::AllocationFailure,
            format!("Memory allocation failed ({length} elements of {element_size} bytes)"),
        )
    }

    pub(crate) fn non_positive_size(length: i32) -> Self {
        Self::new(
            FaultKind::InvalidArraySize,
            format!("Array size must be positive, got {length}"),
        )
    }

    pub(crate) fn negative_declared_size(declared: i32) -> Self {
        Self::new(
            FaultKind::InvalidArraySize,
            format!("Declared array size must not be negative, got {declared}"),
        )
    }

    pub(crate) fn exceeds_declared_size(length: i32, declared: i32) -> Self {
        Self::new(
            FaultKind::InvalidArraySize,
            format!("Array size {length} exceeds declared size {declared}"),
        )
    }

    pub(crate) fn non_positive_element_size(element_size: i32) -> Self {
        Self::new(
            FaultKind::InvalidArraySize,
            format!("Array element size must be positive, got {element_size}"),
        )
    }

    pub(crate) fn string_element_size(element_size: usize, expected: usize) -> Self {
        Self::new(
            FaultKind::InvalidArraySize,
            format!("String array element size must be {expected}, got {element_size}"),
        )
    }

    pub(crate) fn size_mismatch(declared: i32, length: i32) -> Self {
        Self::new(
            FaultKind::ArraySizeMismatch,
            format!("Array size mismatch: declared {declared}, got {length}"),
        )
    }

    pub(crate) fn index_out_of_bounds(index: i32, length: usize) -> Self {
        Self::new(
            FaultKind::IndexOutOfBounds,
            format!("Array index out of bounds: index {index}, length {length}"),
        )
    }

    pub(crate) fn null_array() -> Self {
        Self::new(FaultKind::NullArrayAccess, "Null array access")
    }

    pub(crate) fn released_array() -> Self {
        Self::new(FaultKind::NullArrayAccess, "Access to released array")
    }

    pub(crate) fn null_element_buffer() -> Self {
        Self::new(FaultKind::NullArrayAccess, "Null element buffer")
    }

    pub(crate) fn not_string_array() -> Self {
        Self::new(FaultKind::NullArrayAccess, "String store into non-string array")
    }
}
