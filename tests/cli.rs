//! Command-line behavior of the `svgflat` binary.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

const INPUT: &str = r##"<svg viewBox="10 10 20 20"><g transform="translate(10 10)" fill="#f00"><rect width="4" height="4"/></g></svg>"##;

fn svgflat() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_svgflat"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.svg");
    let output = dir.path().join("out.svg");
    fs::write(&input, INPUT).unwrap();

    let status = svgflat()
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());

    let flat = fs::read_to_string(&output).unwrap();
    assert!(flat.starts_with("<?xml"));
    assert!(flat.contains(r#"viewBox="0 0 20 20""#));
    assert!(flat.contains(r##"fill="#f00""##));
    assert!(flat.contains(r#"x="0.000000""#));
    assert!(!flat.contains("<g"));
}

#[test]
fn test_stdin_to_stdout_with_flags() {
    let mut child = svgflat()
        .args([
            "-",
            "--keep-viewbox-origin",
            "--no-xml-declaration",
            "--fill-to-stroke",
            "1.5",
            "--precision",
            "1",
            "--stats",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(INPUT.as_bytes()).unwrap();
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let flat = String::from_utf8(output.stdout).unwrap();
    assert!(flat.starts_with("<svg"));
    assert!(flat.contains(r#"viewBox="10 10 20 20""#));
    assert!(flat.contains(r#"x="10.0""#));
    assert!(flat.contains(r##"stroke="#f00""##));
    assert!(flat.contains(r#"stroke-width="1.5""#));

    let stats = String::from_utf8(output.stderr).unwrap();
    assert!(stats.contains("1 leaves (1 baked, 0 untouched)"), "{}", stats);
    assert!(stats.contains("1 fills converted to strokes"), "{}", stats);
}

#[test]
fn test_invalid_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.svg");
    fs::write(&input, "<svg><g></svg>").unwrap();

    let output = svgflat().arg(&input).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
