//! Copy releases from a public index into the bucket
//!
//! Requirements are downloaded into a scratch directory by a
//! [`PackageDownloader`], then handed to [`publish`](crate::publish).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use wheelhouse_errors::{ConfigError, Error, OpsError, ResolveError};
use wheelhouse_events::EventEmitter;
use wheelhouse_resolver::parse_artifact;
use wheelhouse_types::Requirement;

use crate::{publish, OpsCtx, PublishOptions, PublishReport};

/// Fetches distributions of a requirement into a local directory
#[async_trait]
pub trait PackageDownloader: Send + Sync {
    /// Download `requirement` into `dest`, along with its dependencies when
    /// `with_deps` is set
    async fn download(&self, requirement: &str, dest: &Path, with_deps: bool)
        -> Result<(), Error>;
}

/// Runs `pip download`
#[derive(Debug, Clone)]
pub struct PipDownloader {
    program: String,
    args: Vec<String>,
}

impl PipDownloader {
    /// Build from a command line such as `pip` or `python3 -m pip`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a blank command.
    pub fn from_command(command: &str) -> Result<Self, Error> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or_else(|| ConfigError::InvalidValue {
            field: "rehost.pip".to_string(),
            value: command.to_string(),
        })?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    #[must_use]
    pub fn with_program(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl PackageDownloader for PipDownloader {
    async fn download(
        &self,
        requirement: &str,
        dest: &Path,
        with_deps: bool,
    ) -> Result<(), Error> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg("download");
        if !with_deps {
            command.arg("--no-deps");
        }
        command.arg("--dest").arg(dest).arg(requirement);
        tracing::debug!(program = %self.program, requirement, with_deps, "running pip download");

        let failed = |message: String| OpsError::DownloadFailed {
            requirement: requirement.to_string(),
            message,
        };
        let output = command
            .output()
            .await
            .map_err(|e| failed(format!("could not run {}: {e}", self.program)))?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().rev().find(|line| !line.trim().is_empty());
        Err(failed(match detail {
            Some(line) => format!("{} ({})", output.status, line.trim()),
            None => output.status.to_string(),
        })
        .into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RehostOptions {
    /// Access policy for the uploaded objects; falls back to `store.acl`
    pub acl: Option<String>,
    /// Upload every downloaded dependency too
    pub with_deps: bool,
}

/// Download `requirements` and publish them
///
/// Without `with_deps` only the distribution matching each requirement is
/// uploaded, one per requirement. With it every downloaded file goes up,
/// in filename order.
///
/// # Errors
///
/// Returns a malformed requirement, a missing downloader, a download
/// failure, `ResolveError::NotFound` when nothing downloaded matches a
/// requirement, or any publish failure.
pub async fn rehost(
    ctx: &OpsCtx,
    requirements: &[String],
    options: &RehostOptions,
) -> Result<PublishReport, Error> {
    if requirements.is_empty() {
        return Err(OpsError::NoInputs {
            operation: "rehost".to_string(),
        }
        .into());
    }
    let parsed = requirements
        .iter()
        .map(|input| input.parse::<Requirement>())
        .collect::<Result<Vec<_>, _>>()?;
    let downloader = ctx
        .downloader
        .as_ref()
        .ok_or_else(|| OpsError::MissingComponent {
            component: "downloader".to_string(),
        })?;

    ctx.emit_operation_started("rehost");
    let result = async {
        let scratch = tempfile::tempdir().map_err(Error::from)?;
        for input in requirements {
            downloader
                .download(input, scratch.path(), options.with_deps)
                .await?;
        }

        let downloaded = downloaded_files(scratch.path()).await?;
        let files = if options.with_deps {
            downloaded
        } else {
            parsed
                .iter()
                .map(|requirement| pick_download(requirement, &downloaded))
                .collect::<Result<Vec<_>, _>>()?
        };
        tracing::debug!(files = files.len(), "rehosting downloaded files");

        publish(
            ctx,
            &files,
            &PublishOptions {
                acl: options.acl.clone(),
            },
        )
        .await
    }
    .await;

    match &result {
        Ok(_) => ctx.emit_operation_completed("rehost", true),
        Err(e) => ctx.emit_operation_failed("rehost", e),
    }
    result
}

/// Regular files in `dir`, sorted by name
async fn downloaded_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?
    {
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| Error::io_with_path(&e, entry.path()))?
            .is_file();
        if is_file {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// First downloaded file that is a release of `requirement` and satisfies it
fn pick_download(requirement: &Requirement, files: &[PathBuf]) -> Result<PathBuf, Error> {
    files
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| parse_artifact(name, &requirement.project))
                .is_some_and(|artifact| {
                    artifact.project == requirement.project && requirement.matches(&artifact.version)
                })
        })
        .cloned()
        .ok_or_else(|| {
            ResolveError::NotFound {
                requirement: requirement.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| Path::new("/tmp/dl").join(name)).collect()
    }

    #[test]
    fn test_pick_download_skips_dependencies() {
        let files = paths(&[
            "package_one-1.0.0-py3-none-any.whl",
            "package_two-0.0.1.tar.gz",
            "six-1.16.0-py2.py3-none-any.whl",
        ]);
        let requirement: Requirement = "package-two".parse().unwrap();
        assert_eq!(
            pick_download(&requirement, &files).unwrap(),
            Path::new("/tmp/dl/package_two-0.0.1.tar.gz")
        );

        let pinned: Requirement = "package-one>1.0".parse().unwrap();
        assert!(matches!(
            pick_download(&pinned, &files),
            Err(Error::Resolve(ResolveError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_pip_command_split() {
        let pip = PipDownloader::from_command("python3 -m pip").unwrap();
        assert_eq!(pip.program, "python3");
        assert_eq!(pip.args, vec!["-m".to_string(), "pip".to_string()]);
        assert!(PipDownloader::from_command("   ").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pip_download_writes_into_dest() {
        let script = r#"while [ $# -gt 0 ]; do
  if [ "$1" = "--dest" ]; then dest="$2"; fi
  if [ "$1" = "--no-deps" ]; then nodeps=1; fi
  last="$1"
  shift
done
[ -n "$nodeps" ] || exit 4
echo "$last" > "$dest/package_one-1.0.0.tar.gz""#;
        let pip = PipDownloader::with_program(
            "sh",
            vec!["-c".to_string(), script.to_string(), "pip".to_string()],
        );
        let dest = tempfile::tempdir().unwrap();
        pip.download("package-one==1.0.0", dest.path(), false)
            .await
            .unwrap();

        let written = std::fs::read_to_string(dest.path().join("package_one-1.0.0.tar.gz")).unwrap();
        assert_eq!(written.trim(), "package-one==1.0.0");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pip_failure_reports_status() {
        let pip = PipDownloader::with_program(
            "sh",
            vec![
                "-c".to_string(),
                "echo 'No matching distribution' >&2; exit 3".to_string(),
                "pip".to_string(),
            ],
        );
        let dest = tempfile::tempdir().unwrap();
        let err = pip
            .download("package-one==9.9", dest.path(), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ops(OpsError::DownloadFailed { ref requirement, ref message })
                if requirement == "package-one==9.9" && message.contains("No matching distribution")
        ));

        let missing = PipDownloader::with_program("/nonexistent/pip", Vec::new());
        assert!(missing
            .download("package-one", dest.path(), true)
            .await
            .is_err());
    }
}
