//! Runs the canonical Intel 8080 conformance suites against the CP/M
//! harness, when present.
//!
//! These test images are not redistributed with this crate. To run them,
//! download TST8080.COM, 8080PRE.COM, CPUTEST.COM and 8080EXM.COM (widely
//! mirrored as part of the classic 8080/Z80 exerciser suite) and place them
//! under `cpu-validation/test_data/i8080/`. Tests for missing files are
//! skipped rather than failed, since they require an external download.

use phosphor_cpu_validation::run_cpm_program;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> Option<PathBuf> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data/i8080")
        .join(name);
    path.exists().then_some(path)
}

fn run_fixture(name: &str, expect_substring: &str) {
    let Some(path) = fixture(name) else {
        eprintln!(
            "skipping {name}: not found under cpu-validation/test_data/i8080/ (download it to run this test)"
        );
        return;
    };
    let image = std::fs::read(&path).expect("failed to read fixture");
    let run = run_cpm_program(&image);
    let output = run.output();
    assert!(
        output.contains(expect_substring),
        "expected output of {name} to contain {expect_substring:?}, got:\n{output}"
    );
}

#[test]
fn tst8080_reports_success() {
    run_fixture("TST8080.COM", "CPU IS OPERATIONAL");
}

#[test]
fn i8080pre_reports_success() {
    run_fixture("8080PRE.COM", "8080 Preliminary tests complete");
}

#[test]
fn cputest_reports_success() {
    run_fixture("CPUTEST.COM", "CPU TESTS OK");
}

#[test]
fn i8080exm_reports_no_errors() {
    let Some(path) = fixture("8080EXM.COM") else {
        eprintln!(
            "skipping 8080EXM.COM: not found under cpu-validation/test_data/i8080/ (download it to run this test)"
        );
        return;
    };
    let image = std::fs::read(&path).expect("failed to read fixture");
    let run = run_cpm_program(&image);
    let output = run.output();
    assert!(!output.contains("ERROR"), "8080EXM.COM reported errors:\n{output}");
}
