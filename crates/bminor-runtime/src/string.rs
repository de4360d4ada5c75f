//! Owned string values
//!
//! A [`BmString`] exclusively owns its bytes. Copies are always deep; there
//! is no shared string representation. The buffer keeps a trailing zero byte
//! so the contents can be handed to C as-is, but the length is tracked
//! separately and never found by scanning for the terminator.

use std::fmt;

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BmString {
    /// Content followed by exactly one terminator byte.
    bytes: Vec<u8>,
}

impl BmString {
    pub fn empty() -> Self {
        Self { bytes: vec![0] }
    }

    /// Allocate a string holding a copy of `literal`.
    pub fn from_literal(literal: &[u8]) -> RuntimeResult<Self> {
        Self::from_parts(&[literal])
    }

    /// Deep copy of `source`; absent stays absent.
    pub fn copy(source: Option<&BmString>) -> RuntimeResult<Option<BmString>> {
        source.map(BmString::try_clone).transpose()
    }

    /// Concatenate two optional strings into a fresh one.
    ///
    /// An absent operand counts as empty, so the result is always a valid
    /// string even when both operands are absent.
    pub fn concat(a: Option<&BmString>, b: Option<&BmString>) -> RuntimeResult<BmString> {
        Self::from_parts(&[
            a.map_or(&[][..], BmString::as_bytes),
            b.map_or(&[][..], BmString::as_bytes),
        ])
    }

    /// Fallible deep copy.
    pub fn try_clone(&self) -> RuntimeResult<Self> {
        Self::from_parts(&[self.as_bytes()])
    }

    fn from_parts(parts: &[&[u8]]) -> RuntimeResult<Self> {
        let total = parts
            .iter()
            .try_fold(1usize, |acc, part| acc.checked_add(part.len()))
            .ok_or_else(|| RuntimeError::allocation_failure(usize::MAX))?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(total)
            .map_err(|_| RuntimeError::allocation_failure(total))?;
        for part in parts {
            bytes.extend_from_slice(part);
        }
        bytes.push(0);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Pointer to the zero-terminated contents, valid while `self` lives.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}

impl Default for BmString {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for BmString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for BmString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BmString({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}
