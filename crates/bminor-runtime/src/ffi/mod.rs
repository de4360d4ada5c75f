//! C ABI entry points called by generated code
//!
//! Generated code cannot receive errors, so every fault detected here is
//! reported through [`crate::report`] and terminates the process. Handles
//! handed out are tracked in [`crate::registry`] until released, which
//! catches most stale and doubly released handles but not one whose address
//! has been reused.
//!
//! All entry points must be called from a single thread. Array reference
//! counts are not atomic.

pub mod array;
pub mod io;
pub mod string;

use std::borrow::Cow;

use core::ffi::{CStr, c_char};

use crate::config::RuntimeConfig;
use crate::error::FaultKind;
use crate::logging;
use crate::registry::{HandleKind, registry};
use crate::report::{report, report_code};

/// Load configuration from the environment and install logging.
///
/// Optional; without it the defaults apply and nothing is logged. Calling it
/// again has no further effect.
#[unsafe(no_mangle)]
pub extern "C" fn _bminor_runtime_init() {
    let config = RuntimeConfig::global();
    logging::init(config);
    tracing::debug!(?config, "runtime initialized");
}

/// Report handles that were never released, with each kind's lifetime
/// totals. Returns how many are live.
#[unsafe(no_mangle)]
pub extern "C" fn _bminor_runtime_shutdown() -> i32 {
    let report_leaks = RuntimeConfig::global().report_leaks;
    let mut live = 0;
    for kind in [HandleKind::Array, HandleKind::String] {
        let count = registry().live_count(kind);
        if count > 0 && report_leaks {
            let stats = registry().stats(kind);
            tracing::warn!(
                ?kind,
                count,
                registered = stats.registered,
                released = stats.released,
                peak_live = stats.peak_live,
                "handles still live at shutdown"
            );
        }
        live += count;
    }
    i32::try_from(live).unwrap_or(i32::MAX)
}

/// Print `message` as a runtime error and exit with `code`.
///
/// # Safety
///
/// `message` must be null or point to a zero-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_runtime_error(message: *const c_char, code: i32) -> ! {
    let message = if message.is_null() {
        Cow::Borrowed("unknown runtime error")
    } else {
        unsafe { CStr::from_ptr(message) }.to_string_lossy()
    };
    match FaultKind::from_code(code) {
        Some(kind) => report(&message, kind),
        None => report_code(&message, code),
    }
}
