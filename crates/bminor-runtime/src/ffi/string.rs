//! String entry points
//!
//! A string handle is a `*mut BmString` owned by whoever received it. Every
//! function returning a handle returns a fresh, independently owned string.

use core::ffi::{CStr, c_char};
use core::ptr;

use crate::config::RuntimeConfig;
use crate::print::write_string;
use crate::registry::{HandleKind, registry};
use crate::report::ResultExt;
use crate::string::BmString;

use super::io::emit;

/// Move `value` to the heap and record the handle as live.
pub(crate) fn into_handle(value: BmString) -> *mut BmString {
    let handle = Box::into_raw(Box::new(value));
    registry().register(handle.cast_const(), HandleKind::String);
    handle
}

/// Borrow the string behind `handle`, treating released handles as null.
///
/// # Safety
///
/// A live `handle` must point to a `BmString` created by this module.
pub(crate) unsafe fn live_string<'a>(handle: *const BmString) -> Option<&'a BmString> {
    if handle.is_null() {
        return None;
    }
    if !registry().admits(handle, HandleKind::String) {
        tracing::warn!(?handle, "use of released string treated as null");
        return None;
    }
    Some(unsafe { &*handle })
}

/// # Safety
///
/// `literal` must be null or point to a zero-terminated string. Null yields
/// an empty string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_string_from_literal(literal: *const c_char) -> *mut BmString {
    let bytes = if literal.is_null() {
        &[][..]
    } else {
        unsafe { CStr::from_ptr(literal) }.to_bytes()
    };
    into_handle(BmString::from_literal(bytes).or_fatal())
}

/// Deep copy of `source`, or null when `source` is null.
///
/// # Safety
///
/// `source` must be null or a handle returned by this runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_string_copy(source: *const BmString) -> *mut BmString {
    match unsafe { live_string(source) } {
        Some(source) => into_handle(source.try_clone().or_fatal()),
        None => ptr::null_mut(),
    }
}

/// New string holding `a` followed by `b`; null operands count as empty.
///
/// # Safety
///
/// Both arguments must be null or handles returned by this runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_string_concat(
    a: *const BmString,
    b: *const BmString,
) -> *mut BmString {
    let (a, b) = unsafe { (live_string(a), live_string(b)) };
    into_handle(BmString::concat(a, b).or_fatal())
}

/// Release a string handle. Null is ignored.
///
/// Releasing a handle twice is caught on a best-effort basis: the second call
/// is ignored with a warning unless a newer string has since been allocated
/// at the same address, in which case that string is freed instead.
///
/// # Safety
///
/// `value` must be null or a handle returned by this runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_string_free(value: *mut BmString) {
    if value.is_null() {
        return;
    }
    let was_live = registry().unregister(value.cast_const(), HandleKind::String);
    if !was_live && RuntimeConfig::global().check_handles {
        tracing::warn!(handle = ?value, "release of released string ignored");
        return;
    }
    drop(unsafe { Box::from_raw(value) });
}

/// Write the string's bytes to stdout. Null prints nothing.
///
/// # Safety
///
/// `value` must be null or a handle returned by this runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn print_bminor_string(value: *const BmString) {
    if let Some(value) = unsafe { live_string(value) } {
        emit(|out| write_string(out, value));
    }
}
