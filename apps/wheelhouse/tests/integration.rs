//! Integration tests for the wheelhouse binary

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const WHEEL: &str = "demo_pkg-1.0.0-py3-none-any.whl";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        std::fs::create_dir(dir.path().join("bucket")).unwrap();
        Self { dir }
    }

    fn write_config(&self, contents: &str) {
        std::fs::write(self.path().join("config.toml"), contents).unwrap();
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_wheelhouse"));
        for var in [
            "WHEELHOUSE_STORE_ROOT",
            "WHEELHOUSE_BUCKET",
            "WHEELHOUSE_ACCESS_KEY",
            "WHEELHOUSE_SECRET_KEY",
            "WHEELHOUSE_PIP",
            "WHEELHOUSE_ACL",
            "WHEELHOUSE_INDEX_URL",
            "WHEELHOUSE_INDEX_USER",
            "WHEELHOUSE_INDEX_PASSWORD",
            "WHEELHOUSE_WORKERS",
            "WHEELHOUSE_COLOR",
            "RUST_LOG",
        ] {
            command.env_remove(var);
        }
        command
            .current_dir(self.path())
            .arg("--config")
            .arg(self.path().join("config.toml"))
            .arg("--store")
            .arg(self.path().join("bucket"))
            .arg("--color")
            .arg("never")
            .args(args)
            .output()
            .expect("failed to execute wheelhouse")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_wheelhouse"))
        .arg("--version")
        .output()
        .expect("failed to execute wheelhouse");

    assert!(output.status.success());
    assert!(stdout(&output).contains("wheelhouse"));
}

#[test]
fn test_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_wheelhouse"))
        .arg("--help")
        .output()
        .expect("failed to execute wheelhouse");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("publish"));
    assert!(text.contains("fetch"));
    assert!(text.contains("list"));
}

#[test]
fn test_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_wheelhouse"))
        .arg("frobnicate")
        .output()
        .expect("failed to execute wheelhouse");

    assert!(!output.status.success());
}

#[test]
fn test_publish_list_fetch() {
    let ws = Workspace::new();
    let artifact = ws.path().join(WHEEL);
    std::fs::write(&artifact, b"wheel bytes").unwrap();

    let output = ws.run(&["publish", artifact.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Uploading demo-pkg/demo_pkg-1.0.0-py3-none-any.whl ..."));
    assert!(text.contains(" done!"));

    let output = ws.run(&["list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "demo-pkg");

    let out_dir = ws.path().join("dist");
    let output = ws.run(&["fetch", "-o", out_dir.to_str().unwrap(), "demo-pkg==1.0.0"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), WHEEL);
    assert_eq!(std::fs::read(out_dir.join(WHEEL)).unwrap(), b"wheel bytes");

    let output = ws.run(&["fetch", "--stdout", "demo-pkg"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(output.stdout, b"wheel bytes");
}

#[test]
fn test_json_list() {
    let ws = Workspace::new();
    let artifact = ws.path().join(WHEEL);
    std::fs::write(&artifact, b"wheel bytes").unwrap();
    assert!(ws.run(&["--json", "publish", artifact.to_str().unwrap()]).status.success());

    let output = ws.run(&["--json", "list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("\"type\": \"ProjectList\""));
    assert!(text.contains("demo-pkg"));
}

#[test]
fn test_fetch_missing_package_fails() {
    let ws = Workspace::new();
    let output = ws.run(&["fetch", "nothing-here==1.0"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("not found"));
}

#[test]
fn test_fetch_url_prints_link() {
    let ws = Workspace::new();
    let artifact = ws.path().join(WHEEL);
    std::fs::write(&artifact, b"wheel bytes").unwrap();
    assert!(ws.run(&["publish", artifact.to_str().unwrap()]).status.success());

    let output = ws.run(&["fetch", "--url", "demo-pkg"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let link = stdout(&output);
    assert!(link.trim().starts_with("file://"));
    assert!(link.trim().ends_with("demo-pkg/demo_pkg-1.0.0-py3-none-any.whl"));
}

#[cfg(unix)]
#[test]
fn test_rehost_with_stub_pip() {
    let ws = Workspace::new();
    let script = ws.path().join("fake-pip.sh");
    std::fs::write(
        &script,
        "while [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--dest\" ]; then dest=\"$2\"; fi\n  shift\ndone\n\
         printf rehosted > \"$dest/demo_pkg-2.0.0.tar.gz\"\n",
    )
    .unwrap();
    ws.write_config(&format!("[rehost]\npip = \"sh {}\"\n", script.display()));

    let output = ws.run(&["rehost", "demo-pkg==2.0.0"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Uploading demo-pkg/demo_pkg-2.0.0.tar.gz ..."));
    assert_eq!(
        std::fs::read(ws.path().join("bucket/demo-pkg/demo_pkg-2.0.0.tar.gz")).unwrap(),
        b"rehosted"
    );
}
