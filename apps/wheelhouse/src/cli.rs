//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wheelhouse_types::ColorChoice;

/// wheelhouse - publish and fetch Python artifacts straight from an object store
#[derive(Parser)]
#[command(name = "wheelhouse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish and fetch Python artifacts straight from an object store")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the data directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bucket root directory
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "bucket")]
    pub store: Option<PathBuf>,

    /// S3 bucket name
    #[arg(long, global = true, value_name = "NAME")]
    pub bucket: Option<String>,

    /// S3 access key
    #[arg(long = "access", global = true, value_name = "KEY", requires = "secret_key")]
    pub access_key: Option<String>,

    /// S3 secret key
    #[arg(long = "secret", global = true, value_name = "KEY", requires = "access_key")]
    pub secret_key: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List projects, or the releases of the given requirements
    #[command(alias = "ls")]
    List {
        /// Requirements such as `name` or `name>=1.0` (empty = all projects)
        requirements: Vec<String>,
    },

    /// Download the best artifact for each requirement
    #[command(alias = "get")]
    Fetch {
        /// Requirements such as `name==1.2.3`
        #[arg(required = true)]
        requirements: Vec<String>,

        /// Prefer a source archive when one exists
        #[arg(long)]
        src: bool,

        /// Prefer an egg over a wheel
        #[arg(long)]
        egg: bool,

        /// Directory to write artifacts into
        #[arg(short, long, value_name = "DIR", conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write artifact bytes to standard output
        #[arg(long)]
        stdout: bool,

        /// Print a time-limited download link instead of downloading
        #[arg(long, alias = "url-only", conflicts_with_all = ["stdout", "output"])]
        url: bool,
    },

    /// Upload artifacts and ask the index server to rebuild
    #[command(alias = "up")]
    Publish {
        /// Artifact files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Canned access policy for the uploaded objects
        #[arg(long)]
        acl: Option<String>,

        /// Index server URL, e.g. https://pypi.example.com/pypi/
        #[arg(long)]
        server: Option<String>,

        /// Index server username
        #[arg(long = "user")]
        username: Option<String>,

        /// Index server password
        #[arg(long)]
        password: Option<String>,
    },

    /// Download packages with pip and publish them
    Rehost {
        /// Requirements such as `name==1.2.3`
        #[arg(required = true)]
        requirements: Vec<String>,

        /// Canned access policy for the uploaded objects
        #[arg(long)]
        acl: Option<String>,

        /// Also upload every dependency pip downloads
        #[arg(long)]
        deps: bool,

        /// Index server URL, e.g. https://pypi.example.com/pypi/
        #[arg(long)]
        server: Option<String>,

        /// Index server username
        #[arg(long = "user")]
        username: Option<String>,

        /// Index server password
        #[arg(long)]
        password: Option<String>,
    },
}

impl Commands {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List { .. } => "list",
            Commands::Fetch { .. } => "fetch",
            Commands::Publish { .. } => "publish",
            Commands::Rehost { .. } => "rehost",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_flags() {
        let cli = Cli::try_parse_from([
            "wheelhouse",
            "--store",
            "/tmp/bucket",
            "fetch",
            "--src",
            "-o",
            "dist",
            "package-one==1.2.3",
        ])
        .unwrap();
        assert_eq!(cli.global.store, Some(PathBuf::from("/tmp/bucket")));
        match cli.command {
            Commands::Fetch {
                requirements,
                src,
                egg,
                output,
                stdout,
                url,
            } => {
                assert_eq!(requirements, vec!["package-one==1.2.3"]);
                assert!(src);
                assert!(!egg);
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert!(!stdout);
                assert!(!url);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_output_conflicts_with_stdout() {
        assert!(Cli::try_parse_from(["wheelhouse", "fetch", "--stdout", "-o", "x", "pkg"]).is_err());
    }

    #[test]
    fn test_publish_requires_files() {
        assert!(Cli::try_parse_from(["wheelhouse", "publish"]).is_err());
    }

    #[test]
    fn test_url_flag_and_alias() {
        let cli = Cli::try_parse_from(["wheelhouse", "--bucket", "wheels", "fetch", "--url-only", "pkg"])
            .unwrap();
        assert_eq!(cli.global.bucket.as_deref(), Some("wheels"));
        assert!(matches!(cli.command, Commands::Fetch { url: true, .. }));
        assert!(Cli::try_parse_from(["wheelhouse", "fetch", "--url", "--stdout", "pkg"]).is_err());
        assert!(
            Cli::try_parse_from(["wheelhouse", "--store", "/tmp/b", "--bucket", "w", "list"]).is_err()
        );
    }

    #[test]
    fn test_keys_come_in_pairs() {
        assert!(Cli::try_parse_from(["wheelhouse", "--access", "AKID", "list"]).is_err());
        let cli = Cli::try_parse_from(["wheelhouse", "--access", "AKID", "--secret", "s", "list"])
            .unwrap();
        assert_eq!(cli.global.access_key.as_deref(), Some("AKID"));
        assert_eq!(cli.global.secret_key.as_deref(), Some("s"));
    }

    #[test]
    fn test_rehost_flags() {
        let cli = Cli::try_parse_from(["wheelhouse", "rehost", "--deps", "--acl", "private", "six"])
            .unwrap();
        assert_eq!(cli.command.name(), "rehost");
        match cli.command {
            Commands::Rehost {
                requirements,
                acl,
                deps,
                ..
            } => {
                assert_eq!(requirements, vec!["six"]);
                assert_eq!(acl.as_deref(), Some("private"));
                assert!(deps);
            }
            _ => panic!("expected rehost"),
        }
    }
}
