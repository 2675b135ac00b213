#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::Command;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "facegate-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_detector(dir: &std::path::Path, output: &str) -> PathBuf {
    let script = dir.join("detector.sh");
    std::fs::write(
        &script,
        format!("#!/bin/sh\ncat > /dev/null\necho '{output}'\n"),
    )
    .expect("detector script should be writable");
    script
}

fn write_png(dir: &std::path::Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_pixel(8, 6, image::Rgb([120, 90, 60]))
        .save(&path)
        .expect("png should be writable");
    path
}

fn facegate() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_facegate"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn version_prints_name_and_version() {
    let output = facegate().arg("version").output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("facegate {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_extended_lists_wire_constants() {
    let output = facegate()
        .args(["version", "--extended"])
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("transports: tcp"));
    assert!(stdout.contains("negotiation=24B"));
}

#[test]
fn camera_over_udp_is_usage_error() {
    let dir = unique_temp_dir("udp");
    let image = write_png(&dir, "door.png");

    let output = facegate()
        .args(["camera", "127.0.0.1", "-P", "9", "-p", "udp"])
        .arg(&image)
        .output()
        .expect("camera should run");

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("udp"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn camera_without_gate_is_transport_error() {
    let dir = unique_temp_dir("refused");
    let image = write_png(&dir, "door.png");
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").expect("probe bind");
        probe.local_addr().expect("probe addr").port()
    };

    let output = facegate()
        .args(["camera", "127.0.0.1", "-P", &port.to_string(), "-d", "0"])
        .arg(&image)
        .output()
        .expect("camera should run");

    assert_eq!(output.status.code(), Some(3));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_writes_embedding_store() {
    let dir = unique_temp_dir("encode");
    let detector = write_detector(
        &dir,
        r#"{"faces":[{"top":0,"right":4,"bottom":4,"left":0,"embedding":[0.1,0.2,0.3]},{"top":1,"right":5,"bottom":5,"left":1,"embedding":[0.4,0.5,0.6]}]}"#,
    );
    let a = write_png(&dir, "a.png");
    let b = write_png(&dir, "b.png");
    let store = dir.join("memory").join("faces.json");

    let output = facegate()
        .args(["--format", "json", "encode", "-e"])
        .arg(&store)
        .args(["-f", "cnn", "--detector", "sh", "--detector-arg"])
        .arg(&detector)
        .arg(&a)
        .arg(&b)
        .output()
        .expect("encode should run");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary should be json");
    assert_eq!(summary["faces"], 4);
    assert_eq!(summary["images"], 2);
    assert_eq!(summary["model"], "cnn");

    let stored: Vec<Vec<f64>> =
        serde_json::from_slice(&std::fs::read(&store).expect("store should exist"))
            .expect("store should parse");
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[1], vec![0.4, 0.5, 0.6]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_with_failing_detector_fails() {
    let dir = unique_temp_dir("encode-fail");
    let image = write_png(&dir, "a.png");

    let output = facegate()
        .args(["encode", "-e"])
        .arg(dir.join("faces.json"))
        .args(["--detector", "false"])
        .arg(&image)
        .output()
        .expect("encode should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(!dir.join("faces.json").exists());
    let _ = std::fs::remove_dir_all(&dir);
}
