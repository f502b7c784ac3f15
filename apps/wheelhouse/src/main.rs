//! wheelhouse - publish and fetch Python artifacts straight from an object store
//!
//! The CLI wires configuration, the bucket and the index notifier into an
//! operations context, then runs one operation while rendering its events.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{colors_enabled, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tracing::{error, info};
use wheelhouse_config::{Config, ConfigOverrides, StoreLocation};
use wheelhouse_events::EventReceiver;
use wheelhouse_net::{HttpRebuildNotifier, NetClient, NetConfig};
use wheelhouse_ops::{
    FetchOptions, FetchTarget, OperationResult, OpsContextBuilder, OpsCtx, PipDownloader,
    PublishOptions, RehostOptions,
};
use wheelhouse_resolver::FormatPreference;
use wheelhouse_store::{FilesystemStore, ObjectStore, S3Settings, S3Store};
use wheelhouse_types::OutputFormat;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting wheelhouse v{}", env!("CARGO_PKG_VERSION"));

    // File (or defaults), then environment, then flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    let store = open_store(&config).await?;
    let downloader = PipDownloader::from_command(&config.rehost.pip)?;
    let client = NetClient::new(NetConfig::from_settings(&config.network))?;

    let color = config.general.color;
    let format = if cli.global.json {
        OutputFormat::Json
    } else {
        config.general.default_output
    };

    let (event_sender, event_receiver) = wheelhouse_events::channel();
    let ctx = OpsContextBuilder::new()
        .with_store(store)
        .with_notifier(Arc::new(HttpRebuildNotifier::new(client)))
        .with_downloader(Arc::new(downloader))
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;

    let renderer = OutputRenderer::new(format, color);
    let mut event_handler =
        EventHandler::new(colors_enabled(color), cli.global.debug, cli.global.json);

    let result =
        execute_command_with_events(cli.command, ctx, event_receiver, &mut event_handler).await?;

    if let OperationResult::FetchReport(report) = &result {
        if report.fetched.iter().any(|artifact| artifact.data.is_some()) {
            let mut stdout = std::io::stdout().lock();
            for data in report.fetched.iter().filter_map(|a| a.data.as_ref()) {
                stdout.write_all(data)?;
            }
            stdout.flush()?;
            return Ok(());
        }
    }

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Bucket selected by `store.bucket` or `store.root`
async fn open_store(config: &Config) -> Result<Arc<dyn ObjectStore>, CliError> {
    let store: Arc<dyn ObjectStore> = match config.store_location()? {
        StoreLocation::Filesystem(root) => Arc::new(FilesystemStore::new(root).await?),
        StoreLocation::S3 { bucket } => {
            let settings = S3Settings {
                bucket: bucket.to_string(),
                region: config.store.region.clone(),
                endpoint: config.store.endpoint.clone(),
                access_key: config.store.access_key.clone(),
                secret_key: config.store.secret_key.clone(),
                force_path_style: config.store.force_path_style,
            };
            Arc::new(S3Store::new(&settings).await?)
        }
    };
    info!(backend = store.backend_name(), "opened bucket");
    Ok(store)
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    info!(command = command.name(), "executing");
    match command {
        Commands::List { requirements } => {
            if requirements.is_empty() {
                let projects = wheelhouse_ops::list_projects(&ctx).await?;
                Ok(OperationResult::ProjectList(projects))
            } else {
                let releases = wheelhouse_ops::list_releases(&ctx, &requirements).await?;
                Ok(OperationResult::ReleaseList(releases))
            }
        }

        Commands::Fetch {
            requirements,
            src,
            egg,
            output,
            stdout,
            url,
        } => {
            let target = if url {
                FetchTarget::Url {
                    expires_in: Duration::from_secs(ctx.config.store.url_expiry),
                }
            } else if stdout {
                FetchTarget::Stdout
            } else {
                FetchTarget::Directory(output.unwrap_or_else(|| PathBuf::from(".")))
            };
            let options = FetchOptions {
                preference: FormatPreference {
                    prefer_source: src,
                    prefer_egg: egg,
                },
                target,
            };
            let report = wheelhouse_ops::fetch(&ctx, &requirements, &options).await?;
            Ok(OperationResult::FetchReport(report))
        }

        Commands::Publish { files, acl, .. } => {
            let report = wheelhouse_ops::publish(&ctx, &files, &PublishOptions { acl }).await?;
            Ok(OperationResult::PublishReport(report))
        }

        Commands::Rehost {
            requirements,
            acl,
            deps,
            ..
        } => {
            let options = RehostOptions {
                acl,
                with_deps: deps,
            };
            let report = wheelhouse_ops::rehost(&ctx, &requirements, &options).await?;
            Ok(OperationResult::PublishReport(report))
        }
    }
}

/// Apply flags on top of file and environment settings
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    let mut overrides = ConfigOverrides {
        store_root: global.store.clone(),
        bucket: global.bucket.clone(),
        access_key: global.access_key.clone(),
        secret_key: global.secret_key.clone(),
        ..ConfigOverrides::default()
    };
    if let Commands::Publish {
        acl,
        server,
        username,
        password,
        ..
    }
    | Commands::Rehost {
        acl,
        server,
        username,
        password,
        ..
    } = command
    {
        overrides.acl.clone_from(acl);
        overrides.server.clone_from(server);
        overrides.username.clone_from(username);
        overrides.password.clone_from(password);
    }
    config.apply_overrides(overrides);
}

/// Initialize tracing
///
/// Debug mode writes JSON logs to the data directory; JSON mode keeps the
/// console clean.
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let default_filter = "info,wheelhouse=debug,wheelhouse_ops=debug,wheelhouse_transfer=debug";

    if debug_enabled {
        if let Some(file) = open_log_file(json_mode) {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
                )
                .init();
            return;
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

fn open_log_file(quiet: bool) -> Option<std::fs::File> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wheelhouse")
        .join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        if !quiet {
            eprintln!("Warning: Failed to create log directory: {e}");
        }
        return None;
    }

    let log_file = log_dir.join(format!(
        "wheelhouse-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    match std::fs::File::create(&log_file) {
        Ok(file) => {
            if !quiet {
                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Some(file)
        }
        Err(e) => {
            if !quiet {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            None
        }
    }
}
