use std::net::TcpListener;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const VX_VARS: [&str; 9] = [
    "VX_API_BASE_URL",
    "VX_REQUEST_TIMEOUT",
    "VX_UPLOAD_STALL_TIMEOUT",
    "VX_DEFAULT_STYLE",
    "VX_RAMP_INTENSITY",
    "VX_SLOW_SPEED",
    "VX_RAMP_CENTER",
    "VX_RAMP_WIDTH",
    "VX_CONFIG_PATH",
];

/// A command running in an empty directory with no vxcam variables set.
fn isolated(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vxcamctl");
    cmd.current_dir(dir.path());
    for var in VX_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn retime_prints_a_longer_schedule_for_slow_motion() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args([
            "retime",
            "--frames",
            "300",
            "--fps",
            "30",
            "--ramp-intensity",
            "0",
            "--slow-speed",
            "0.5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("source frames   300"))
        .stdout(predicate::str::contains("source duration 10.000s"));
}

#[test]
fn retime_rejects_zero_fps() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["retime", "--frames", "10", "--fps", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot build retime plan"));
}

#[test]
fn retime_rejects_frame_rates_too_small_to_time() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["retime", "--frames", "10", "--fps", "1e-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot build retime plan"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn preview_runs_to_the_end_of_the_clip() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["preview", "--duration", "1.5", "--every", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slow window 0.30..0.70"))
        .stdout(predicate::str::contains("ticks, played in"));
}

#[test]
fn invalid_profile_flags_fail_before_running() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["preview", "--duration", "2", "--ramp-width", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn config_file_values_are_applied() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("vxcam.toml"),
        "[motion]\nramp_center = 0.25\nramp_width = 0.1\n",
    )
    .unwrap();
    isolated(&dir)
        .args(["preview", "--duration", "1", "--every", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slow window 0.15..0.35"));
}

#[test]
fn submit_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["submit", "no-such-clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open clip"));
}

#[test]
fn submit_against_unreachable_api_reports_network_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("run.mp4"), b"not really video").unwrap();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api_url = format!("http://127.0.0.1:{port}");

    isolated(&dir)
        .args(["submit", "run.mp4", "--api-url", api_url.as_str()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[SIGNING]"))
        .stdout(predicate::str::contains("[ERROR]"))
        .stderr(predicate::str::contains("Network error"));
}
