use std::path::Path;

use assert_cmd::Command;
use pretty_assertions::assert_eq;

include!(concat!(env!("OUT_DIR"), "/test_files.rs"));

const EXPECT_OUTPUT: &str = "// expect: ";
const EXPECT_RUNTIME_ERROR: &str = "// expect runtime error: ";
const EXPECT_COMPILE_ERROR: &str = "// expect error: ";

/// What a test script says it should do, read from its comments.
#[derive(Debug, Default)]
struct Expectations {
    stdout: Vec<String>,
    stderr: Vec<String>,
    exit_code: i32,
}

impl Expectations {
    fn parse(filename: &Path) -> Self {
        let content = std::fs::read_to_string(filename)
            .unwrap_or_else(|_| panic!("failed to read {}", filename.display()));

        let mut result = Self::default();
        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;

            if let Some(expected) = after(line, EXPECT_OUTPUT) {
                result.stdout.push(expected.to_owned());
            } else if let Some(expected) = after(line, EXPECT_RUNTIME_ERROR) {
                result.stderr.push(format!("[line {line_number}] {expected}"));
                result.exit_code = 70;
            } else if let Some(expected) = after(line, EXPECT_COMPILE_ERROR) {
                result.stderr.push(format!("[line {line_number}] {expected}"));
                result.exit_code = 65;
            }
        }

        result
    }
}

fn after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.rfind(marker).map(|idx| &line[idx + marker.len()..])
}

fn do_test(filename: &Path) {
    let expected = Expectations::parse(filename);

    let output = Command::cargo_bin("loxwalk")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg(filename)
        .output()
        .unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    assert_eq!(expected.stdout.join("\n"), stdout.trim_end(), "stderr={stderr}");
    assert_eq!(expected.stderr.join("\n"), stderr.trim_end());
    assert_eq!(Some(expected.exit_code), output.status.code());
}
