//! Scalar print and math entry points

use core::ffi::c_char;
use std::io::{self, StdoutLock, Write};

use crate::math;
use crate::print::{write_bool, write_char, write_float, write_int};

/// Run `write` against stdout and flush.
///
/// The host program may exit without returning through Rust, so nothing is
/// left in the buffer between calls.
pub(crate) fn emit(write: impl FnOnce(&mut StdoutLock<'_>) -> io::Result<()>) {
    let mut out = io::stdout().lock();
    if let Err(error) = write(&mut out).and_then(|()| out.flush()) {
        tracing::warn!("stdout write failed: {error}");
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn print_int(value: i32) {
    emit(|out| write_int(out, value));
}

#[unsafe(no_mangle)]
pub extern "C" fn print_float(value: f32) {
    emit(|out| write_float(out, value));
}

#[unsafe(no_mangle)]
pub extern "C" fn print_char(value: c_char) {
    emit(|out| write_char(out, value as u8));
}

#[unsafe(no_mangle)]
pub extern "C" fn print_bool(value: i8) {
    emit(|out| write_bool(out, value != 0));
}

#[unsafe(no_mangle)]
pub extern "C" fn pow_int(base: i32, exp: i32) -> i32 {
    math::pow_int(base, exp)
}
