use std::process::{Command, Stdio};
use tempfile::tempdir;

#[test]
fn token_prompt_goes_to_stderr_not_json_output() {
    let td = tempdir().unwrap();
    let cfg_path = td.path().join("beatport4.toml");
    let toml = format!(
        "tokenfile = {:?}\nlog_dir = {:?}\napi_base = \"http://127.0.0.1:9\"\n",
        td.path().join("beatport_token.json").display().to_string(),
        td.path().join("logs").display().to_string(),
    );
    std::fs::write(&cfg_path, toml).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_beatport4"))
        .arg("--config")
        .arg(&cfg_path)
        .args(["track", "3001"])
        .env_remove("BEATPORT_API_BASE")
        .stdin(Stdio::null())
        .output()
        .expect("run beatport4");

    assert!(!out.status.success());
    assert!(out.stdout.is_empty(), "stdout: {}", String::from_utf8_lossy(&out.stdout));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("paste the /token endpoint response"), "stderr: {}", stderr);
    assert!(!td.path().join("beatport_token.json").exists());
}
