//! Guards the headless driver binary against warnings sneaking in.

use std::process::Command;

#[test]
fn driver_binary_checks_cleanly() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "quiz-defence"])
        .status()
        .expect("failed to invoke cargo check on the quiz-defence binary");

    assert!(status.success(), "cargo check --bin quiz-defence should succeed");
}
