use std::process::Command;

#[test]
fn test_missing_arguments_print_usage() {
    let binary_path = env!("CARGO_BIN_EXE_binsize");

    let output = Command::new(binary_path).output().expect("Failed to run binsize");

    let stderr = String::from_utf8_lossy(&output.stderr);
    println!("stderr: {stderr}");
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("--library"));
}

#[test]
fn test_unreadable_library_is_config_error() {
    let binary_path = env!("CARGO_BIN_EXE_binsize");
    let tmp = tempfile::tempdir().unwrap();
    let outfile = tmp.path().join("out.txt");

    let output = Command::new(binary_path)
        .args(["--library", "/nonexistent/out/Release/lib/libmissing.so", "--outfile"])
        .arg(&outfile)
        .output()
        .expect("Failed to run binsize");

    println!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.status.code(), Some(78));
    assert!(!outfile.exists(), "nothing should be written before the library is validated");
}

#[test]
fn test_thread_count_must_be_positive() {
    let binary_path = env!("CARGO_BIN_EXE_binsize");

    let output = Command::new(binary_path)
        .args(["--library", "lib.so", "--outfile", "out.txt", "--threads", "0"])
        .output()
        .expect("Failed to run binsize");

    assert_eq!(output.status.code(), Some(2));
}
