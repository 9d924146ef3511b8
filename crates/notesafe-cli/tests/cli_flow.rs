use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_notesafe"))
}

/// Isolated HOME and XDG dirs for one test.
struct TestEnv {
    dir: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be available");
        std::fs::create_dir_all(dir.path().join("c")).expect("create config dir");
        std::fs::create_dir_all(dir.path().join("d")).expect("create data dir");
        Self { dir }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("c").join("notesafe").join("config.toml")
    }

    fn vault_path(&self) -> PathBuf {
        self.dir.path().join("d").join("notesafe").join("vault.db")
    }

    fn cmd(&self, pin: Option<&str>) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("c"))
            .env("XDG_DATA_HOME", self.dir.path().join("d"))
            .env("NO_COLOR", "1")
            .env_remove("NOTESAFE_VAULT")
            .env_remove("NOTESAFE_CONFIG")
            .env_remove("NOTESAFE_NEW_PIN")
            .env_remove("NOTESAFE_LOG");
        match pin {
            Some(pin) => cmd.env("NOTESAFE_PIN", pin),
            None => cmd.env_remove("NOTESAFE_PIN"),
        };
        cmd
    }

    fn run(&self, pin: Option<&str>, args: &[&str]) -> Output {
        self.cmd(pin).args(args).output().expect("run notesafe")
    }

    fn init(&self, pin: &str, extra: &[&str]) {
        let mut args = vec!["init"];
        args.extend_from_slice(extra);
        let output = self.run(Some(pin), &args);
        assert_success(&output);
    }
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn add_note(env: &TestEnv, pin: &str, text: &str, extra: &[&str]) -> i64 {
    let mut args = vec!["add", text, "--json"];
    args.extend_from_slice(extra);
    json(&env.run(Some(pin), &args))["id"]
        .as_i64()
        .expect("note id")
}

#[test]
fn test_cli_init_add_list_search() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    assert!(env.config_path().exists());
    assert!(env.vault_path().exists());

    add_note(&env, "1234", "Buy milk", &[]);
    add_note(&env, "1234", "Call Bob", &[]);

    let notes = json(&env.run(Some("1234"), &["list", "--json"]));
    let texts: Vec<_> = notes
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["text"].as_str().expect("text").to_string())
        .collect();
    assert_eq!(texts, vec!["Buy milk", "Call Bob"]);

    let hits = json(&env.run(Some("1234"), &["search", "MILK", "--json"]));
    assert_eq!(hits.as_array().expect("array").len(), 1);
    assert_eq!(hits[0]["text"], "Buy milk");

    let none = json(&env.run(Some("1234"), &["search", "eggs", "--json"]));
    assert!(none.as_array().expect("array").is_empty());
}

#[test]
fn test_cli_plaintext_not_on_disk() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    add_note(&env, "1234", "very secret words", &[]);

    let bytes = std::fs::read(env.vault_path()).expect("read vault");
    let needle = b"very secret words";
    assert!(!bytes.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn test_cli_init_writes_config() {
    let env = TestEnv::new();
    env.init("1234", &["--max-attempts", "3", "--lockout-seconds", "90"]);

    let contents = std::fs::read_to_string(env.config_path()).expect("read config");
    assert!(contents.contains("max_attempts = 3"));
    assert!(contents.contains("duration_seconds = 90"));
    assert!(contents.contains("vault.db"));
}

#[test]
fn test_cli_init_rejects_out_of_range_lockout() {
    let env = TestEnv::new();
    for extra in [
        ["--lockout-seconds", "10000000000000"],
        ["--lockout-seconds", "0"],
        ["--max-attempts", "0"],
        ["--max-attempts", "500"],
    ] {
        let output = env.run(Some("1234"), &[&["init"][..], &extra[..]].concat());
        assert_eq!(output.status.code(), Some(4), "{:?}", extra);
        assert!(stderr(&output).contains("Invalid [lockout] settings"));
    }
    assert!(!env.vault_path().exists());
    assert!(!env.config_path().exists());
}

#[test]
fn test_cli_init_twice_is_rejected() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    let output = env.run(Some("5678"), &["init"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_cli_init_rejects_malformed_pin() {
    let env = TestEnv::new();
    let output = env.run(Some("12"), &["init"]);
    assert_eq!(output.status.code(), Some(4));

    let output = env.run(Some("abcd"), &["init"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_cli_missing_vault_message() {
    let env = TestEnv::new();
    let output = env.run(Some("1234"), &["list"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("No vault found"));
    assert!(err.contains("notesafe init"));
}

#[test]
fn test_cli_wrong_pin_exit_code() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    let output = env.run(Some("0000"), &["list"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("Incorrect PIN. 4 attempt(s) remaining"));
}

#[test]
fn test_cli_no_pin_without_tty() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    let output = env.run(None, &["list"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("NOTESAFE_PIN"));
}

#[test]
fn test_cli_lockout_persists_across_processes() {
    let env = TestEnv::new();
    env.init("1234", &["--max-attempts", "2", "--lockout-seconds", "120"]);

    let first = env.run(Some("0000"), &["list"]);
    assert!(stderr(&first).contains("1 attempt(s) remaining"));
    let second = env.run(Some("0000"), &["list"]);
    assert_eq!(second.status.code(), Some(5));
    assert!(stderr(&second).contains("Too many failed attempts"));

    // The right PIN is not even checked during a lockout
    let output = env.run(Some("1234"), &["list"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("Try again in"));

    let status = json(&env.run(None, &["status", "--json"]));
    assert_eq!(status["state"], "locked out");
    assert!(status["lockout_remaining_seconds"].as_u64().expect("seconds") > 100);
}

#[test]
fn test_cli_status_wait_ends_lockout() {
    let env = TestEnv::new();
    env.init("1234", &["--max-attempts", "1", "--lockout-seconds", "1"]);
    let output = env.run(Some("0000"), &["list"]);
    assert_eq!(output.status.code(), Some(5));

    let status = json(&env.run(None, &["status", "--wait", "--json"]));
    assert_eq!(status["state"], "locked");
    assert_eq!(status["waited"], true);
    assert!(status["lockout_remaining_seconds"].is_null());

    assert_success(&env.run(Some("1234"), &["list"]));
}

#[test]
fn test_cli_folder_cascade() {
    let env = TestEnv::new();
    env.init("1234", &[]);

    let folder = json(&env.run(Some("1234"), &["folder", "create", "Work", "--json"]));
    assert_eq!(folder["id"], 2);
    assert_eq!(folder["name"], "Work");

    let kept = add_note(&env, "1234", "keep me", &[]);
    let draft = add_note(&env, "1234", "draft", &["--folder", "2"]);

    let folders = json(&env.run(Some("1234"), &["folder", "list", "--json"]));
    assert_eq!(folders[0]["name"], "General");
    assert_eq!(folders[0]["note_count"], 1);
    assert_eq!(folders[1]["note_count"], 1);

    let deleted = json(&env.run(Some("1234"), &["folder", "delete", "2", "--yes", "--json"]));
    assert_eq!(deleted["notes_removed"], 1);

    let output = env.run(Some("1234"), &["show", &draft.to_string()]);
    assert_eq!(output.status.code(), Some(3));
    let output = env.run(Some("1234"), &["list", "--folder", "2"]);
    assert_eq!(output.status.code(), Some(3));

    let shown = json(&env.run(Some("1234"), &["show", &kept.to_string(), "--json"]));
    assert_eq!(shown["text"], "keep me");

    let output = env.run(Some("1234"), &["folder", "delete", "1", "--yes"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_cli_delete_requires_yes_without_tty() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    let id = add_note(&env, "1234", "temp", &[]).to_string();

    let output = env.run(Some("1234"), &["delete", &id]);
    assert_eq!(output.status.code(), Some(4));

    assert_success(&env.run(Some("1234"), &["delete", &id, "--yes"]));
    let output = env.run(Some("1234"), &["show", &id]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_edit_keeps_attachment() {
    let env = TestEnv::new();
    env.init("1234", &[]);

    let source = env.dir.path().join("receipt.pdf");
    std::fs::write(&source, b"%PDF-fake").expect("write attachment");
    let id = add_note(
        &env,
        "1234",
        "lunch",
        &["--attach", source.to_str().expect("utf-8 path")],
    )
    .to_string();

    let edited = json(&env.run(Some("1234"), &["edit", &id, "team lunch", "--json"]));
    assert_eq!(edited["text"], "team lunch");
    assert_eq!(edited["attachment"]["name"], "receipt.pdf");
    assert_eq!(edited["attachment"]["media_type"], "application/pdf");

    let saved = env.dir.path().join("copy.pdf");
    assert_success(&env.run(
        Some("1234"),
        &["show", &id, "--save-attachment", saved.to_str().expect("utf-8 path")],
    ));
    assert_eq!(std::fs::read(&saved).expect("read copy"), b"%PDF-fake");
}

#[test]
fn test_cli_empty_note_rejected() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    let output = env.run(Some("1234"), &["add", "   "]);
    assert_eq!(output.status.code(), Some(4));
    let notes = json(&env.run(Some("1234"), &["list", "--json"]));
    assert!(notes.as_array().expect("array").is_empty());
}

#[test]
fn test_cli_change_pin() {
    let env = TestEnv::new();
    env.init("1234", &[]);
    add_note(&env, "1234", "survives", &[]);

    let output = env
        .cmd(Some("1234"))
        .env("NOTESAFE_NEW_PIN", "5678")
        .args(["change-pin", "--json"])
        .output()
        .expect("run notesafe");
    let result = json(&output);
    assert_eq!(result["reencrypted"], 1);
    assert_eq!(result["skipped"], 0);

    let output = env.run(Some("1234"), &["list"]);
    assert_eq!(output.status.code(), Some(5));

    let notes = json(&env.run(Some("5678"), &["list", "--json"]));
    assert_eq!(notes[0]["text"], "survives");
}

#[test]
fn test_cli_reset_from_lockout() {
    let env = TestEnv::new();
    env.init("1234", &["--max-attempts", "1", "--lockout-seconds", "300"]);
    add_note(&env, "1234", "gone", &[]);
    env.run(Some("0000"), &["list"]);

    let output = env.run(None, &["reset"]);
    assert_eq!(output.status.code(), Some(4));

    assert_success(&env.run(None, &["reset", "--yes"]));
    let status = json(&env.run(None, &["status", "--json"]));
    assert_eq!(status["state"], "uninitialized");
    assert_eq!(status["initialized"], false);

    env.init("2468", &[]);
    let notes = json(&env.run(Some("2468"), &["list", "--json"]));
    assert!(notes.as_array().expect("array").is_empty());
}

#[test]
fn test_cli_vault_flag_overrides_default() {
    let env = TestEnv::new();
    let custom = env.dir.path().join("elsewhere.db");
    let custom_arg = custom.to_str().expect("utf-8 path");

    let output = env.run(Some("1234"), &["--vault", custom_arg, "init"]);
    assert_success(&output);
    assert!(custom.exists());
    assert!(!env.vault_path().exists());

    // Later commands find it through the config file
    add_note(&env, "1234", "moved", &[]);
    let notes = json(&env.run(Some("1234"), &["list", "--json"]));
    assert_eq!(notes[0]["text"], "moved");
}

#[test]
fn test_cli_shell_session() {
    let env = TestEnv::new();
    env.init("1234", &[]);

    let attachment = env.dir.path().join("photo.png");
    std::fs::write(&attachment, [7u8; 8]).expect("write attachment");

    let script = format!(
        "unlock\n12\n34\nmkdir Trips\ncd 2\nattach {}\nadd from the shell\nls\nlock\nls\nquit\n",
        attachment.display()
    );
    let mut child = env
        .cmd(None)
        .arg("shell")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn shell");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(script.as_bytes())
        .expect("write script");
    let output = child.wait_with_output().expect("wait for shell");
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unlocked."));
    assert!(stdout.contains("Now in Trips."));
    assert!(stdout.contains("from the shell"));
    assert!(stderr(&output).contains("Vault is locked"));

    let notes = json(&env.run(Some("1234"), &["list", "--folder", "2", "--json"]));
    assert_eq!(notes[0]["text"], "from the shell");
    assert_eq!(notes[0]["attachment"]["name"], "photo.png");
}

#[test]
fn test_cli_completions() {
    let env = TestEnv::new();
    let output = env.run(None, &["completions", "bash"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("notesafe"));
}
