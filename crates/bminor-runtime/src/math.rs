//! Integer arithmetic helpers

/// `base` raised to `exp`.
///
/// Overflow wraps. A negative exponent yields the truncated real result, so
/// only bases 1 and -1 produce a nonzero value.
pub fn pow_int(base: i32, exp: i32) -> i32 {
    match u32::try_from(exp) {
        Ok(exp) => base.wrapping_pow(exp),
        Err(_) => match base {
            1 => 1,
            -1 if exp % 2 == 0 => 1,
            -1 => -1,
            _ => 0,
        },
    }
}
