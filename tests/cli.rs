use assert_cmd::prelude::*;
use predicates::str::contains;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

fn build_manifest() -> NamedTempFile {
    let manifest = r#"{
  "skeletons": {
    "character-pro": {
      "json": "spine/character-pro.json",
      "binary": "spine/character-pro.skel",
      "atlas": "spine/character-pro.atlas",
      "textures": {
        "1x": "spine/character-pro.webp",
        "2x": "spine/character-pro@2x.webp",
        "fallback": "spine/character-pro.png"
      }
    }
  }
}
"#;
    let mut tmp = NamedTempFile::new().expect("temp manifest");
    tmp.write_all(manifest.as_bytes()).expect("write manifest");
    tmp
}

#[test]
fn cli_boots_high_tier_and_recycles_characters() {
    let manifest = build_manifest();
    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg(manifest.path())
        .args(["--memory", "8", "--cores", "4", "--user-agent", "desktop"])
        .args(["--spawn", "3"]);
    cmd.assert()
        .success()
        .stdout(contains("Device quality: high"))
        .stdout(contains(
            "Profile: pool=100 particles=1.00 shadows=high textures=2x low_graphics=false",
        ))
        .stdout(contains("Loaded 1 skeleton(s)"))
        .stdout(contains(
            " - character-pro (spine/character-pro.skel, texture spine/character-pro@2x.webp)",
        ))
        .stdout(contains("Spawned 3 character(s)"))
        .stdout(contains("Characters updated on frame 1: 3"))
        .stdout(contains(" - character-pro available=97 in_use=3 total=100"))
        .stdout(contains(" - character-pro available=100 in_use=0 total=100"))
        .stdout(contains("World shut down"));
}

#[test]
fn cli_low_memory_device_runs_in_low_graphics() {
    let manifest = build_manifest();
    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg(manifest.path())
        .args(["--memory", "2", "--cores", "4", "--user-agent", "desktop"])
        .args(["--spawn", "2"]);
    cmd.assert()
        .success()
        .stdout(contains("Device quality: low"))
        .stdout(contains("pool=20"))
        .stdout(contains("low_graphics=true"))
        .stdout(contains("Characters updated on frame 1: 0"));
}

#[test]
fn cli_pool_grows_past_initial_size() {
    let manifest = build_manifest();
    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg(manifest.path())
        .args(["--memory", "2", "--spawn", "25"]);
    cmd.assert()
        .success()
        .stdout(contains(" - character-pro available=0 in_use=25 total=25"))
        .stdout(contains(" - character-pro available=25 in_use=0 total=25"));
}

#[test]
fn cli_migrates_and_persists_preferences() {
    let manifest = build_manifest();
    let dir = tempdir().expect("temp dir");
    let prefs = dir.path().join("prefs.json");
    fs::write(&prefs, r#"{"septerra_low_graphics": "true"}"#).expect("write prefs");

    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg(manifest.path())
        .args(["--user-agent", "mobile safari"])
        .arg("--prefs")
        .arg(&prefs);
    cmd.assert()
        .success()
        .stdout(contains("Device quality: medium"))
        .stdout(contains("low_graphics=true"));

    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg(manifest.path())
        .args(["--user-agent", "mobile safari", "--low-graphics", "off"])
        .arg("--prefs")
        .arg(&prefs);
    cmd.assert().success().stdout(contains("low_graphics=false"));

    let stored = fs::read_to_string(&prefs).expect("read prefs");
    assert!(stored.contains(r#""etidorhpa_low_graphics": "false""#));
    assert!(stored.contains(r#""septerra_low_graphics": "true""#));
}

#[test]
fn cli_survives_missing_manifest() {
    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg("no/such/manifest.json").args(["--cores", "4"]);
    cmd.assert()
        .success()
        .stdout(contains("Loaded 0 skeleton(s)"))
        .stdout(contains("World shut down"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let mut cmd = Command::cargo_bin("etidorhpa-client").expect("binary exists");
    cmd.arg("manifest.json").arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
