//! B-Minor runtime library.
//!
//! Provides the operations compiled B-Minor programs cannot express inline:
//! - Owned strings with deep-copy semantics ([`BmString`])
//! - Reference-counted, bounds-checked arrays ([`Array`])
//! - Scalar printing and integer power
//!
//! The Rust API reports faults as [`RuntimeError`] values. The C ABI in
//! [`ffi`] is what generated code links against; there every fault is fatal
//! and ends the process with the fault's exit code. Stale or doubly released
//! handles are detected on a best-effort basis by [`registry`], which keys
//! handles by address and so cannot tell a stale handle from a newer one
//! allocated at the same place.

pub mod array;
pub mod config;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod math;
pub mod print;
pub mod registry;
pub mod report;
pub mod string;

pub use array::{Array, Element, ElementKind};
pub use config::RuntimeConfig;
pub use error::{FaultKind, RuntimeError, RuntimeResult};
pub use ffi::array::BmArray;
pub use string::BmString;
