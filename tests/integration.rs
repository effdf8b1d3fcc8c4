use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const DATE: &str = "2024-05-01";

fn kyc_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("kyc");
    path
}

struct TestEnv {
    tmp: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn base(&self) -> PathBuf {
        self.tmp.path().join("desk")
    }

    fn root(&self) -> PathBuf {
        self.base().join(format!("KYC docs {}", DATE))
    }

    fn source(&self) -> PathBuf {
        self.tmp.path().join("scans")
    }
}

fn setup_test_env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("desk");
    fs::create_dir_all(&base).unwrap();

    // Source tree with one relevant file per client, plus noise
    let scans = tmp.path().join("scans");
    fs::create_dir_all(scans.join("nested")).unwrap();
    fs::write(scans.join("Jane Doe passport.pdf"), vec![b'p'; 5000]).unwrap();
    fs::write(scans.join("nested").join("123_utility.pdf"), vec![b'u'; 3000]).unwrap();
    fs::write(scans.join("jane doe ack.pdf"), b"excluded").unwrap();
    fs::write(scans.join("random.pdf"), b"noise").unwrap();
    fs::write(scans.join("amy lee id.png"), vec![b'a'; 2000]).unwrap();

    fs::write(
        tmp.path().join("clients.csv"),
        "123,Jane Doe\n456,Bob Ray\n,Nobody\n789,Amy Lee\n",
    )
    .unwrap();

    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[workspace]
base_dir = "{}"

[matching]
exclusion_words = ["ack", "of", "debt", "aod", "pensions"]
near_duplicate_tolerance = 1024

[server]
bind = "127.0.0.1:0"
"#,
        base.display()
    );
    let config_path = config_dir.join("kyc.toml");
    fs::write(&config_path, config_content).unwrap();

    TestEnv { tmp, config_path }
}

fn run_kyc(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = kyc_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--date")
        .arg(DATE)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run kyc binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn intake(env: &TestEnv) {
    let table = env.tmp.path().join("clients.csv");
    let (stdout, stderr, success) = run_kyc(&env.config_path, &["intake", table.to_str().unwrap()]);
    assert!(success, "intake failed: stdout={}, stderr={}", stdout, stderr);
}

#[test]
fn test_intake_creates_folders() {
    let env = setup_test_env();
    let table = env.tmp.path().join("clients.csv");

    let (stdout, stderr, success) = run_kyc(&env.config_path, &["intake", table.to_str().unwrap()]);
    assert!(success, "intake failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("folders created: 3"));
    assert!(stdout.contains("rows skipped: 1"));
    assert!(stdout.contains("ok"));

    assert!(env.root().join("Jane Doe 123").is_dir());
    assert!(env.root().join("Bob Ray 456").is_dir());
    assert!(env.root().join("Amy Lee 789").is_dir());
}

#[test]
fn test_intake_idempotent() {
    let env = setup_test_env();
    intake(&env);

    let table = env.tmp.path().join("clients.csv");
    let (stdout, _, success) = run_kyc(&env.config_path, &["intake", table.to_str().unwrap()]);
    assert!(success, "Second intake failed (not idempotent)");
    assert!(stdout.contains("folders created: 0"));
    assert!(stdout.contains("already present: 3"));
}

#[test]
fn test_intake_rejects_single_column_table() {
    let env = setup_test_env();
    let table = env.tmp.path().join("narrow.csv");
    fs::write(&table, "123\n456\n").unwrap();

    let (_, stderr, success) = run_kyc(&env.config_path, &["intake", table.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("two columns"), "stderr: {}", stderr);
}

#[test]
fn test_collect_copies_matching_files() {
    let env = setup_test_env();
    intake(&env);

    let source = env.source();
    let (stdout, stderr, success) = run_kyc(
        &env.config_path,
        &["collect", source.to_str().unwrap(), "--progress", "off"],
    );
    assert!(success, "collect failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("folders processed: 3"));
    assert!(stdout.contains("files copied: 3"));
    assert!(stdout.contains("empty folders: 1"));
    assert!(stdout.contains("    - Bob Ray 456"));

    let jane = env.root().join("Jane Doe 123");
    assert!(jane.join("Jane Doe passport.pdf").is_file());
    assert!(jane.join("123_utility.pdf").is_file());
    assert!(!jane.join("jane doe ack.pdf").exists());
    assert!(env.root().join("Amy Lee 789").join("amy lee id.png").is_file());
}

#[test]
fn test_collect_second_run_copies_nothing() {
    let env = setup_test_env();
    intake(&env);
    let source = env.source();

    run_kyc(&env.config_path, &["collect", source.to_str().unwrap()]);
    let (stdout, _, success) = run_kyc(&env.config_path, &["collect", source.to_str().unwrap()]);
    assert!(success);
    assert!(
        stdout.contains("files copied: 0"),
        "Expected duplicates to be skipped, got: {}",
        stdout
    );
}

#[test]
fn test_collect_without_exclusions() {
    let env = setup_test_env();
    intake(&env);
    let source = env.source();

    let (stdout, _, success) = run_kyc(
        &env.config_path,
        &["collect", source.to_str().unwrap(), "--no-exclusions"],
    );
    assert!(success);
    assert!(stdout.contains("files copied: 4"), "got: {}", stdout);
    assert!(env
        .root()
        .join("Jane Doe 123")
        .join("jane doe ack.pdf")
        .is_file());
}

#[test]
fn test_collect_missing_root_fails() {
    let env = setup_test_env();
    let source = env.source();

    let (_, stderr, success) = run_kyc(&env.config_path, &["collect", source.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not found"), "stderr: {}", stderr);
}

#[test]
fn test_collect_invalid_source_fails() {
    let env = setup_test_env();
    intake(&env);
    let missing = env.tmp.path().join("no-such-dir");

    let (_, stderr, success) = run_kyc(&env.config_path, &["collect", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not valid"), "stderr: {}", stderr);
}

#[test]
fn test_collect_one_fills_single_folder() {
    let env = setup_test_env();
    intake(&env);

    let extra = env.tmp.path().join("hr-share");
    fs::create_dir_all(&extra).unwrap();
    fs::write(extra.join("bob ray contract.pdf"), vec![b'c'; 4000]).unwrap();
    fs::write(extra.join("jane doe contract.pdf"), vec![b'j'; 4000]).unwrap();

    let (stdout, stderr, success) = run_kyc(
        &env.config_path,
        &["collect-one", extra.to_str().unwrap(), "Bob Ray 456"],
    );
    assert!(success, "collect-one failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("files copied: 1"));
    assert!(env
        .root()
        .join("Bob Ray 456")
        .join("bob ray contract.pdf")
        .is_file());
    assert!(!env
        .root()
        .join("Jane Doe 123")
        .join("jane doe contract.pdf")
        .exists());
}

#[test]
fn test_collect_one_unknown_folder_fails() {
    let env = setup_test_env();
    intake(&env);
    let source = env.source();

    let (_, stderr, success) = run_kyc(
        &env.config_path,
        &["collect-one", source.to_str().unwrap(), "Nobody Here 000"],
    );
    assert!(!success);
    assert!(stderr.contains("Nobody Here 000"), "stderr: {}", stderr);
}

#[test]
fn test_inventory_lists_empty_folders_sorted() {
    let env = setup_test_env();
    intake(&env);

    let (stdout, _, success) = run_kyc(&env.config_path, &["inventory"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["Amy Lee 789", "Bob Ray 456", "Jane Doe 123"]);
}

#[test]
fn test_inventory_without_root_is_empty() {
    let env = setup_test_env();

    let (stdout, _, success) = run_kyc(&env.config_path, &["inventory"]);
    assert!(success);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_archive_written_to_base_dir() {
    let env = setup_test_env();
    intake(&env);
    run_kyc(&env.config_path, &["collect", env.source().to_str().unwrap()]);

    let (stdout, stderr, success) = run_kyc(&env.config_path, &["archive"]);
    assert!(success, "archive failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Archived 3 files"));

    let zip_path = env.base().join("kyc_documents_archive.zip");
    let archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"Bob Ray 456/"));
    assert!(names.contains(&"Jane Doe 123/Jane Doe passport.pdf"));
}

#[test]
fn test_archive_without_root_fails() {
    let env = setup_test_env();

    let (_, _, success) = run_kyc(&env.config_path, &["archive"]);
    assert!(!success);
    assert!(!env.base().join("kyc_documents_archive.zip").exists());
}

#[test]
fn test_report_custom_output() {
    let env = setup_test_env();
    intake(&env);
    run_kyc(&env.config_path, &["collect", env.source().to_str().unwrap()]);

    let out = env.tmp.path().join("reports").join("summary.csv");
    let (stdout, stderr, success) = run_kyc(
        &env.config_path,
        &["report", "--output", out.to_str().unwrap()],
    );
    assert!(success, "report failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Wrote summary of 3 folders"));

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Identifier,Name,Documents Found");
    assert_eq!(lines[1], "789,Amy Lee,amy lee id.png");
    assert_eq!(lines[2], "456,Bob Ray,No documents");
    assert_eq!(
        lines[3],
        "123,Jane Doe,\"123_utility.pdf, Jane Doe passport.pdf\""
    );
}

#[test]
fn test_help_lists_commands() {
    let env = setup_test_env();

    let (stdout, stderr, success) = run_kyc(&env.config_path, &["--help"]);
    assert!(success, "stderr: {}", stderr);
    for command in ["intake", "collect", "collect-one", "inventory", "archive", "report", "serve"] {
        assert!(stdout.contains(command), "missing {} in: {}", command, stdout);
    }
}

#[test]
fn test_intake_rejects_unknown_table_type() {
    let env = setup_test_env();
    let table = env.tmp.path().join("clients.txt");
    fs::write(&table, "123,Jane Doe\n").unwrap();

    let (_, stderr, success) = run_kyc(&env.config_path, &["intake", table.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Unsupported client table"), "stderr: {}", stderr);
    assert!(!env.root().exists());
}

#[test]
fn test_archive_inside_root_rejected() {
    let env = setup_test_env();
    intake(&env);

    let dest = env.root().join("out.zip");
    let (_, stderr, success) = run_kyc(
        &env.config_path,
        &["archive", "--output", dest.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("inside the folder being archived"), "stderr: {}", stderr);
    assert!(!dest.exists());
}
