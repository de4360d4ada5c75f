//! Fatal fault reporting
//!
//! Generated code has no way to handle a returned error, so every fault that
//! reaches the C ABI ends here: one diagnostic line on stderr, then the
//! process exits with the fault's code. Nothing in this module returns.

use std::io::{self, Write};

use crate::error::{FaultKind, RuntimeError, RuntimeResult};

/// Render the diagnostic line for `message`.
pub fn write_diagnostic(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "Runtime error: {message}")?;
    out.flush()
}

/// Report `message` and terminate with `kind`'s exit status.
pub fn report(message: &str, kind: FaultKind) -> ! {
    tracing::error!(code = kind.code(), %kind, "{message}");
    report_code(message, kind.code())
}

/// Report a fault value and terminate.
pub fn fatal(error: &RuntimeError) -> ! {
    report(error.message(), error.kind())
}

/// Report with a raw exit status, as supplied by generated code.
pub fn report_code(message: &str, code: i32) -> ! {
    // Nothing useful can be done if stderr itself is gone.
    let _ = write_diagnostic(&mut io::stderr().lock(), message);
    std::process::exit(code)
}

/// Turn a runtime result into its value or a fatal report.
pub trait ResultExt<T> {
    fn or_fatal(self) -> T;
}

impl<T> ResultExt<T> for RuntimeResult<T> {
    fn or_fatal(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => fatal(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(message: &str) -> String {
        let mut buf = Vec::new();
        write_diagnostic(&mut buf, message).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_diagnostic_line() {
        let err = RuntimeError::size_mismatch(5, 3);
        insta::assert_snapshot!(
            render(err.message()).trim_end(),
            @"Runtime error: Array size mismatch: declared 5, got 3"
        );
    }

    #[test]
    fn test_diagnostic_is_single_line() {
        let rendered = render("Null array access");
        assert_eq!(rendered.lines().count(), 1);
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_or_fatal_passes_values_through() {
        let ok: RuntimeResult<i32> = Ok(7);
        assert_eq!(ok.or_fatal(), 7);
    }
}
