use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const CONFIG: &str = r#"
version = 1

[settings]
screen_zoom = 1.2

[reveal]
char_delay = "5ms"

[presets.amber]
signal_shift = 2.5
"#;

fn config_dir() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("cathode.toml"), CONFIG).unwrap();
    root
}

fn cathode(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cathode"))
        .env("CATHODE_CONFIG_DIR", config_dir.path())
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run cathode")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn settings_list_shows_resolved_values() {
    let dir = config_dir();
    let output = cathode(&dir, &["--set", "gridOpacity=0.5", "settings", "list"]);
    assert!(output.status.success(), "{output:?}");

    let listing = stdout(&output);
    let zoom = listing
        .lines()
        .find(|line| line.contains("screenZoom"))
        .expect("screenZoom row");
    assert!(zoom.contains("1.200"), "{zoom}");
    let grid = listing
        .lines()
        .find(|line| line.contains("gridOpacity"))
        .expect("gridOpacity row");
    assert!(grid.contains("0.500"), "{grid}");
    assert!(listing.contains("SIGNAL GLITCH:"));
}

#[test]
fn settings_dump_applies_preset_and_overrides() {
    let dir = config_dir();
    let output = cathode(
        &dir,
        &[
            "--preset",
            "amber",
            "--set",
            "jitter_chance=0",
            "settings",
            "dump",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "{output:?}");

    let dumped: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(dumped["screen_zoom"], serde_json::json!(1.2));
    assert_eq!(dumped["signal_shift"], serde_json::json!(2.5));
    assert_eq!(dumped["jitter_chance"], serde_json::json!(0.0));
    assert_eq!(dumped.as_object().unwrap().len(), 14);
}

#[test]
fn settings_dump_toml_is_a_config_file() {
    let dir = config_dir();
    let output = cathode(&dir, &["settings", "dump"]);
    assert!(output.status.success(), "{output:?}");
    let dumped = stdout(&output);
    assert!(dumped.starts_with("version = 1"));
    assert!(dumped.contains("[settings]"));
    assert!(dumped.contains("screen_zoom = 1.2"));
}

#[test]
fn unknown_preset_fails() {
    let dir = config_dir();
    let output = cathode(&dir, &["--preset", "missing", "settings", "list"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing"), "{stderr}");
}

#[test]
fn type_with_zero_delay_prints_full_text() {
    let dir = config_dir();
    let text = "[  OK  ] Started CRT subsystem\n[ WARN ] 0x1F jitter detected\nroot@retroscreen:~$";
    let file = dir.path().join("boot.txt");
    fs::write(&file, text).unwrap();

    let output = cathode(
        &dir,
        &[
            "type",
            file.to_str().unwrap(),
            "--char-delay",
            "0ms",
            "--no-color",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), format!("{text}\n"));
}

#[test]
fn type_reads_stdin_with_configured_delay() {
    let dir = config_dir();
    let mut child = Command::new(env!("CARGO_BIN_EXE_cathode"))
        .env("CATHODE_CONFIG_DIR", dir.path())
        .env("RUST_LOG", "warn")
        .args(["type", "--no-color"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("failed to spawn cathode type");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"hello\r\nworld\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "hello\nworld\n");
}

#[test]
fn where_reports_config_location() {
    let dir = TempDir::new().unwrap();
    let output = cathode(&dir, &["where"]);
    assert!(output.status.success(), "{output:?}");
    let report = stdout(&output);
    assert!(report.contains(&dir.path().join("cathode.toml").display().to_string()));
    assert!(report.contains("(missing)"));
    assert!(report.contains("Presets: (none)"));
}
