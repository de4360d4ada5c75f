//! Text output for scalar and string values
//!
//! Output matches the C runtime the compiler was first paired with: no
//! separators or newlines are added, floats use six decimal places.

use std::io::{self, Write};

use crate::string::BmString;

pub fn write_int(out: &mut impl Write, value: i32) -> io::Result<()> {
    write!(out, "{value}")
}

pub fn write_float(out: &mut impl Write, value: f32) -> io::Result<()> {
    if value.is_nan() {
        out.write_all(b"nan")
    } else if value.is_infinite() {
        out.write_all(if value > 0.0 { &b"inf"[..] } else { &b"-inf"[..] })
    } else {
        write!(out, "{value:.6}")
    }
}

/// Writes the raw byte, whatever its encoding.
pub fn write_char(out: &mut impl Write, value: u8) -> io::Result<()> {
    out.write_all(&[value])
}

pub fn write_bool(out: &mut impl Write, value: bool) -> io::Result<()> {
    out.write_all(if value { &b"true"[..] } else { &b"false"[..] })
}

pub fn write_string(out: &mut impl Write, value: &BmString) -> io::Result<()> {
    out.write_all(value.as_bytes())
}
