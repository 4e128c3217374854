use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const LOCAL_CONF: &str = "
[[local|localrc]]
a=b
c=d
f=1
[[post-config|$NEUTRON_CONF]]
[DEFAULT]
global_physnet_mtu=1450
[[post-config|$NOVA_CONF]]
[upgrade_levels]
compute = auto
";

fn dsconf_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dsconf"));
    // Keep config discovery inside the test directory.
    cmd.current_dir(dir).env_remove("RUST_LOG").arg("--no-color");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    dsconf_cmd(dir).args(args).output().unwrap()
}

// ===========================================
// INI commands
// ===========================================

#[test]
fn test_iniset_existing_key() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n[second]\ne = f\n").unwrap();

    let output = run(dir.path(), &["iniset", file.to_str().unwrap(), "default", "a", "2"]);

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "[default]\na = 2\n[second]\ne = f\n"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated:"));
}

#[test]
fn test_iniset_new_section() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n[second]\ne = f\n").unwrap();

    run(dir.path(), &["iniset", file.to_str().unwrap(), "new", "s", "t"]);

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "[default]\na = b\n[second]\ne = f\n[new]\ns = t\n"
    );
}

#[test]
fn test_iniset_creates_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("new.ini");

    let output = run(dir.path(), &["iniset", file.to_str().unwrap(), "DEFAULT", "debug", "True"]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&file).unwrap(), "[DEFAULT]\ndebug = True\n");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Created:"));
}

#[test]
fn test_inicomment_and_iniuncomment() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    let original = "[default]\n# keep\na = b\n";
    fs::write(&file, original).unwrap();

    run(dir.path(), &["inicomment", file.to_str().unwrap(), "default", "a"]);
    assert_eq!(fs::read_to_string(&file).unwrap(), "[default]\n# keep\n# a = b\n");

    run(dir.path(), &["iniuncomment", file.to_str().unwrap(), "default", "a"]);
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[test]
fn test_inirm() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\nc = d\n").unwrap();

    let output = run(dir.path(), &["inirm", file.to_str().unwrap(), "default", "a"]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&file).unwrap(), "[default]\nc = d\n");
}

#[test]
fn test_inirm_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("missing.ini");

    let output = run(dir.path(), &["inirm", file.to_str().unwrap(), "default", "a"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(!file.exists());
}

#[test]
fn test_unchanged_file_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = run(dir.path(), &["inirm", file.to_str().unwrap(), "default", "zzz"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

// ===========================================
// local.conf commands
// ===========================================

#[test]
fn test_extract() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    let target = dir.path().join("nova.conf");
    fs::write(&lc, LOCAL_CONF).unwrap();

    let output = run(
        dir.path(),
        &[
            "extract",
            lc.to_str().unwrap(),
            "post-config",
            "$NOVA_CONF",
            target.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "[upgrade_levels]\ncompute = auto\n"
    );
}

#[test]
fn test_extract_localrc() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    let localrc = dir.path().join("localrc");
    fs::write(&lc, LOCAL_CONF).unwrap();

    run(
        dir.path(),
        &["extract-localrc", lc.to_str().unwrap(), localrc.to_str().unwrap()],
    );

    assert_eq!(fs::read_to_string(&localrc).unwrap(), "a=b\nc=d\nf=1\n");
}

#[test]
fn test_setlc() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    fs::write(&lc, LOCAL_CONF).unwrap();

    run(dir.path(), &["setlc", lc.to_str().unwrap(), "g", "2"]);

    assert_eq!(
        fs::read_to_string(&lc).unwrap(),
        LOCAL_CONF.replace("f=1\n", "f=1\ng=2\n")
    );
}

#[test]
fn test_setlc_raw_joins_items() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    fs::write(&lc, LOCAL_CONF).unwrap();

    run(
        dir.path(),
        &[
            "setlc_raw",
            lc.to_str().unwrap(),
            "enable_plugin",
            "foo",
            "http://foo",
            "branch",
        ],
    );

    assert_eq!(
        fs::read_to_string(&lc).unwrap(),
        LOCAL_CONF.replace("f=1\n", "f=1\nenable_plugin foo http://foo branch\n")
    );
}

#[test]
fn test_setlc_conf() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    fs::write(&lc, LOCAL_CONF).unwrap();

    run(
        dir.path(),
        &[
            "setlc_conf",
            lc.to_str().unwrap(),
            "post-config",
            "$NEUTRON_CONF",
            "DEFAULT",
            "global_physnet_mtu",
            "1400",
        ],
    );

    assert_eq!(
        fs::read_to_string(&lc).unwrap(),
        LOCAL_CONF.replace("global_physnet_mtu=1450", "global_physnet_mtu = 1400")
    );
}

#[test]
fn test_merge_lc_multiple_sources() {
    let dir = TempDir::new().unwrap();
    let lc = dir.path().join("local.conf");
    let src1 = dir.path().join("a.conf");
    let src2 = dir.path().join("b.conf");
    fs::write(&lc, LOCAL_CONF).unwrap();
    fs::write(&src1, "[[local|localrc]]\nx=1\n").unwrap();
    fs::write(&src2, "[[post-config|$NOVA_CONF]]\n[upgrade_levels]\ncompute = 1.2\n").unwrap();

    let output = run(
        dir.path(),
        &[
            "merge_lc",
            lc.to_str().unwrap(),
            src1.to_str().unwrap(),
            src2.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(&lc).unwrap(),
        LOCAL_CONF
            .replace("f=1\n", "f=1\nx=1\n")
            .replace("compute = auto", "compute = 1.2")
    );
}

// ===========================================
// Output modes and configuration
// ===========================================

#[test]
fn test_diff_mode_shows_changes() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = run(dir.path(), &["--diff", "iniset", file.to_str().unwrap(), "default", "a", "c"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("---"));
    assert!(stdout.contains("+++"));
    assert!(stdout.contains("-a = b"));
    assert!(stdout.contains("+a = c"));
}

#[test]
fn test_quiet_mode_output() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = run(dir.path(), &["--quiet", "iniset", file.to_str().unwrap(), "default", "a", "c"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test.ini"));
    assert!(!stdout.contains("Updated:"));
}

#[test]
fn test_config_file_enables_quiet() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join("dsconf.toml"), "[output]\nquiet = true\n").unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = run(dir.path(), &["iniset", file.to_str().unwrap(), "default", "a", "c"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test.ini"));
    assert!(!stdout.contains("Updated:"));
}

#[test]
fn test_in_place_flag() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = run(
        dir.path(),
        &["--in-place", "iniset", file.to_str().unwrap(), "default", "a", "c"],
    );

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&file).unwrap(), "[default]\na = c\n");
}

#[test]
fn test_rust_log_controls_logging() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test.ini");
    fs::write(&file, "[default]\na = b\n").unwrap();

    let output = dsconf_cmd(dir.path())
        .env("RUST_LOG", "info")
        .args(["iniset", file.to_str().unwrap(), "default", "a", "c"])
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stderr).contains("wrote file"));

    // Without RUST_LOG only warnings are shown
    let output = run(dir.path(), &["iniset", file.to_str().unwrap(), "default", "a", "d"]);
    assert!(!String::from_utf8_lossy(&output.stderr).contains("wrote file"));
}

#[cfg(unix)]
#[test]
fn test_iniset_through_symlink() {
    let dir = TempDir::new().unwrap();
    let real = dir.path().join("real.ini");
    let link = dir.path().join("link.ini");
    fs::write(&real, "[default]\na = b\n").unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let output = run(dir.path(), &["iniset", link.to_str().unwrap(), "default", "a", "2"]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&real).unwrap(), "[default]\na = 2\n");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}

#[test]
fn test_no_subcommand_prints_help_and_fails() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &[]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("iniset"));
}

#[test]
fn test_init_creates_config() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["--init"]);

    assert!(output.status.success());
    let content = fs::read_to_string(dir.path().join("dsconf.toml")).unwrap();
    assert!(content.contains("[write]"));

    // A second run refuses to overwrite it
    let output = run(dir.path(), &["--init"]);
    assert!(!output.status.success());
}
