
use fixtures::*;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::process::Command;
use tempfile::tempdir;

fn gadget_dump() -> Command {
    Command::new(assert_cmd::cargo_bin!("gadget_dump"))
}

#[test]
fn it_dumps_json_to_stdout() {
    let sample = hello_world_sample();

    let out = gadget_dump().arg(sample.to_str().unwrap()).output().unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["moduleAttributes"]["title"], "Hello, World!");
    assert_eq!(v["views"]["default"]["content"], "Goodbye, World!");
}

#[test]
fn it_prints_one_line_per_input_in_jsonl() {
    let out = gadget_dump()
        .args([
            "-o",
            "jsonl",
            hello_world_sample().to_str().unwrap(),
            full_featured_sample().to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(first["moduleAttributes"]["title"], "Hello, World!");
    assert_eq!(second["moduleAttributes"]["title"], "Weather & Time");
}

#[test]
fn it_reads_from_stdin_with_dash() {
    let input = read_sample(hello_world_sample());

    assert_cmd::Command::from_std(gadget_dump())
        .args(["-o", "summary", "-"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("title: Hello, World!"))
        .stdout(predicate::str::contains("views: default"));
}

#[test]
fn it_reports_every_syntax_error_and_fails() {
    let out = gadget_dump()
        .arg(sample_with_broken_syntax().to_str().unwrap())
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&out.stderr);
    let diagnostics = stderr.lines().filter(|l| l.starts_with('\t')).count();
    assert!(diagnostics >= 3, "stderr: {stderr}");
}

#[test]
fn it_still_dumps_valid_inputs_when_one_fails() {
    gadget_dump()
        .args([
            "-o",
            "summary",
            sample_without_module_prefs().to_str().unwrap(),
            hello_world_sample().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("title: Hello, World!"))
        .stderr(predicate::str::contains("Missing ModulePrefs block"));
}

#[test]
fn it_enforces_max_size() {
    gadget_dump()
        .args(["--max-size", "16", hello_world_sample().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the configured limit"));
}

#[test]
fn it_rejects_deep_nesting_without_crashing() {
    let d = tempdir().unwrap();
    let f = d.path().join("deep.xml");

    let depth = 140_000;
    let mut xml = String::from("<Module><ModulePrefs/><Content>x</Content><UserPref>");
    xml.push_str(&"<a>".repeat(depth));
    xml.push_str(&"</a>".repeat(depth));
    xml.push_str("</UserPref></Module>");
    fs::write(&f, xml).unwrap();

    gadget_dump()
        .args(["-o", "summary", f.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("maximum depth of 256"));

    gadget_dump()
        .args(["--max-depth", "1", hello_world_sample().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("maximum depth of 1"));
}

#[test]
fn it_respects_directory_output() {
    let _guard = CLI_TEST_LOCK.lock().unwrap();
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");

    let sample = hello_world_sample();

    let mut cmd = gadget_dump();
    cmd.args(["-f", &f.to_string_lossy(), sample.to_str().unwrap()]);

    assert!(
        cmd.output().unwrap().stdout.is_empty(),
        "Expected output to be printed to file, but was printed to stdout"
    );

    let mut expected = vec![];

    File::open(&f).unwrap().read_to_end(&mut expected).unwrap();
    assert!(
        !expected.is_empty(),
        "Expected output to be printed to file"
    )
}

#[test]
fn test_it_refuses_to_overwrite_directory() {
    let d = tempdir().unwrap();

    let sample = hello_world_sample();
    let mut cmd = gadget_dump();
    cmd.args(["-f", &d.path().to_string_lossy(), sample.to_str().unwrap()]);

    cmd.assert().failure().code(1);
}

#[test]
fn test_it_overwrites_file_anyways_if_passed_flag() {
    let _guard = CLI_TEST_LOCK.lock().unwrap();
    let d = tempdir().unwrap();
    let f = d.as_ref().join("test.out");

    let mut file = File::create(&f).unwrap();
    file.write_all(b"I'm a file!").unwrap();

    let sample = hello_world_sample();
    let mut cmd = gadget_dump();
    cmd.args([
        "-f",
        &f.to_string_lossy(),
        "--no-confirm-overwrite",
        sample.to_str().unwrap(),
    ]);

    cmd.assert().success();

    let written = fs::read_to_string(&f).unwrap();
    assert!(written.contains("Goodbye, World!"));
}
