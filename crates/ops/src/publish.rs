//! Upload a batch of artifacts and notify the index server

use std::path::PathBuf;

use wheelhouse_errors::Error;
use wheelhouse_events::{EventEmitter, FailureContext, IndexEvent};
use wheelhouse_net::admin_rebuild_url;
use wheelhouse_store::validate_policy;

use crate::{IndexNotification, OpsCtx, PublishOptions, PublishReport};

/// Upload `files` in order, then ask the index server to rebuild
///
/// The batch stops at the first failed upload and the rebuild is not
/// requested. The rebuild is also skipped when the index server, username
/// or password is not configured.
///
/// # Errors
///
/// Returns the first upload failure, an unknown access policy, or the
/// rebuild request failure.
pub async fn publish(
    ctx: &OpsCtx,
    files: &[PathBuf],
    options: &PublishOptions,
) -> Result<PublishReport, Error> {
    if files.is_empty() {
        return Err(wheelhouse_errors::OpsError::NoInputs {
            operation: "publish".to_string(),
        }
        .into());
    }

    let acl = options
        .acl
        .as_deref()
        .or(ctx.config.store.acl.as_deref());
    if let Some(policy) = acl {
        validate_policy(policy)?;
    }

    ctx.emit_operation_started("publish");
    let engine = ctx.transfer_engine();

    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        match engine.upload(file, acl).await {
            Ok(report) => uploads.push(report),
            Err(e) => {
                ctx.emit_index(IndexEvent::RebuildSkipped {
                    reason: format!("upload of {} failed", file.display()),
                });
                ctx.emit_operation_failed("publish", &e);
                return Err(e);
            }
        }
    }

    let index = match notify_index(ctx).await {
        Ok(index) => index,
        Err(e) => {
            ctx.emit_operation_failed("publish", &e);
            return Err(e);
        }
    };

    ctx.emit_operation_completed("publish", true);
    Ok(PublishReport { uploads, index })
}

async fn notify_index(ctx: &OpsCtx) -> Result<IndexNotification, Error> {
    let skip = |reason: &str| -> Result<IndexNotification, Error> {
        ctx.emit_index(IndexEvent::RebuildSkipped {
            reason: reason.to_string(),
        });
        Ok(IndexNotification::Skipped {
            reason: reason.to_string(),
        })
    };

    let Some((server, username, password)) = ctx.config.index.credentials() else {
        return skip("index server credentials are not configured");
    };
    let Some(notifier) = &ctx.notifier else {
        return skip("no rebuild notifier available");
    };

    let url = admin_rebuild_url(server).map_or_else(|_| server.to_string(), |url| url.to_string());
    ctx.emit_index(IndexEvent::RebuildRequested { url: url.clone() });

    match notifier.notify_rebuild(server, username, password).await {
        Ok(outcome) => {
            ctx.emit_index(IndexEvent::RebuildCompleted {
                url: outcome.url.clone(),
                status: outcome.status,
            });
            Ok(IndexNotification::Notified {
                server: server.to_string(),
                url: outcome.url,
                http_status: outcome.status,
            })
        }
        Err(e) => {
            ctx.emit_index(IndexEvent::RebuildFailed {
                url,
                failure: FailureContext::from_error(&e),
            });
            Err(e)
        }
    }
}
