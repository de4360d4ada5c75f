//! Faults at the C ABI terminate the process with the fault's exit code
//!
//! Each case re-runs this test binary as a child process restricted to
//! `fault_child`, which triggers the fault named in the environment.

use std::process::{Command, Output};
use std::mem::size_of;
use std::ptr;

use bminor_runtime::FaultKind;
use bminor_runtime::ffi::_bminor_runtime_error;
use bminor_runtime::ffi::array::*;

const SCENARIO_VAR: &str = "BMINOR_FAULT_SCENARIO";

fn run_scenario(scenario: &str) -> Output {
    let exe = std::env::current_exe().expect("test binary path");
    Command::new(exe)
        .args(["fault_child", "--exact", "--nocapture", "--test-threads=1"])
        .env(SCENARIO_VAR, scenario)
        .output()
        .expect("spawn child test process")
}

fn assert_fault(scenario: &str, kind: FaultKind, message: &str) {
    let output = run_scenario(scenario);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        output.status.code(),
        Some(kind.code()),
        "scenario {scenario}: stderr was {stderr}"
    );
    assert!(
        stderr.contains(&format!("Runtime error: {message}")),
        "scenario {scenario}: stderr was {stderr}"
    );
}

#[test]
fn fault_child() {
    let Ok(scenario) = std::env::var(SCENARIO_VAR) else {
        return;
    };
    let mut out = [0u8; 4];
    unsafe {
        match scenario.as_str() {
            "zero_length" => {
                _bminor_array_new(0, 0, 4, false);
            }
            "size_mismatch" => {
                _bminor_array_new(3, 5, 4, false);
            }
            "index_past_end" => {
                let array = _bminor_array_new(4, 0, 4, false);
                _bminor_array_get(array, 4, out.as_mut_ptr());
            }
            "negative_index" => {
                let array = _bminor_array_new(4, 0, 4, false);
                _bminor_array_set(array, -1, out.as_ptr());
            }
            "null_get" => _bminor_array_get(ptr::null(), 0, out.as_mut_ptr()),
            "null_set" => _bminor_array_set(ptr::null(), 0, out.as_ptr()),
            "released_get" => {
                let array = _bminor_array_new(1, 0, 4, false);
                _bminor_array_decref(array);
                _bminor_array_get(array, 0, out.as_mut_ptr());
            }
            "set_string_scalar" => {
                let array = _bminor_array_new(2, 0, 4, false);
                _bminor_array_set_string(array, 0, ptr::null());
            }
            "set_string_out_of_bounds" => {
                let array = _bminor_array_new(2, 0, size_of::<*const u8>() as i32, true);
                _bminor_array_set_string(array, 2, ptr::null());
            }
            "explicit" => _bminor_runtime_error(c"division by zero".as_ptr(), 2),
            other => panic!("unknown scenario {other}"),
        }
    }
    panic!("scenario {scenario} did not terminate the process");
}

#[test]
fn test_invalid_size_exits() {
    assert_fault(
        "zero_length",
        FaultKind::InvalidArraySize,
        "Array size must be positive, got 0",
    );
}

#[test]
fn test_size_mismatch_exits() {
    assert_fault(
        "size_mismatch",
        FaultKind::ArraySizeMismatch,
        "Array size mismatch: declared 5, got 3",
    );
}

#[test]
fn test_out_of_bounds_exits() {
    assert_fault(
        "index_past_end",
        FaultKind::IndexOutOfBounds,
        "Array index out of bounds: index 4, length 4",
    );
    assert_fault(
        "negative_index",
        FaultKind::IndexOutOfBounds,
        "Array index out of bounds: index -1, length 4",
    );
}

#[test]
fn test_null_access_exits() {
    assert_fault("null_get", FaultKind::NullArrayAccess, "Null array access");
    assert_fault("null_set", FaultKind::NullArrayAccess, "Null array access");
    assert_fault(
        "released_get",
        FaultKind::NullArrayAccess,
        "Access to released array",
    );
}

#[test]
fn test_explicit_runtime_error_exits() {
    assert_fault("explicit", FaultKind::InvalidArraySize, "division by zero");
}

#[test]
fn test_set_string_faults_exit() {
    assert_fault(
        "set_string_scalar",
        FaultKind::NullArrayAccess,
        "String store into non-string array",
    );
    assert_fault(
        "set_string_out_of_bounds",
        FaultKind::IndexOutOfBounds,
        "Array index out of bounds: index 2, length 2",
    );
}
