//! Resolve requirements and download the chosen artifacts

use wheelhouse_errors::Error;
use wheelhouse_events::{EventEmitter, FailureContext, ResolverEvent};
use wheelhouse_resolver::resolve;
use wheelhouse_types::Requirement;

use crate::{FetchOptions, FetchReport, FetchTarget, FetchedArtifact, OpsCtx};

/// Fetch one artifact per requirement, in order
///
/// The bucket is listed once. The batch stops at the first requirement
/// that fails to parse, resolve or download; artifacts already written
/// stay on disk.
///
/// # Errors
///
/// Returns the first failure: a malformed requirement, a `ResolveError`,
/// a storage error or a local write error.
pub async fn fetch(
    ctx: &OpsCtx,
    requirements: &[String],
    options: &FetchOptions,
) -> Result<FetchReport, Error> {
    if requirements.is_empty() {
        return Err(wheelhouse_errors::OpsError::NoInputs {
            operation: "fetch".to_string(),
        }
        .into());
    }

    ctx.emit_operation_started("fetch");
    let keys = ctx.store.list_objects().await?;

    let mut fetched = Vec::with_capacity(requirements.len());
    for input in requirements {
        match fetch_one(ctx, input, &keys, options).await {
            Ok(artifact) => fetched.push(artifact),
            Err(e) => {
                ctx.emit_operation_failed("fetch", &e);
                return Err(e);
            }
        }
    }

    ctx.emit_operation_completed("fetch", true);
    Ok(FetchReport { fetched })
}

async fn fetch_one(
    ctx: &OpsCtx,
    input: &str,
    keys: &[String],
    options: &FetchOptions,
) -> Result<FetchedArtifact, Error> {
    let requirement: Requirement = input.parse()?;
    let rendered = requirement.to_string();

    ctx.emit_resolver(ResolverEvent::ResolutionStarted {
        requirement: rendered.clone(),
        keys: keys.len(),
    });
    let resolution = match resolve(&requirement, keys, options.preference) {
        Ok(resolution) => resolution,
        Err(e) => {
            ctx.emit_resolver(ResolverEvent::ResolutionFailed {
                requirement: rendered,
                failure: FailureContext::from_error(&e),
            });
            return Err(e);
        }
    };
    ctx.emit_resolver(ResolverEvent::CandidateSelected {
        requirement: rendered.clone(),
        key: resolution.key.clone(),
        version: resolution.version.to_string(),
        format: resolution.format.to_string(),
    });

    if let FetchTarget::Url { expires_in } = options.target {
        let url = ctx.store.presigned_url(&resolution.key, expires_in).await?;
        tracing::debug!(key = %resolution.key, expires = expires_in.as_secs(), "presigned artifact");
        return Ok(FetchedArtifact {
            requirement: rendered,
            key: resolution.key,
            filename: resolution.filename,
            version: resolution.version.to_string(),
            format: resolution.format,
            size: None,
            destination: None,
            url: Some(url),
            data: None,
        });
    }

    let data = ctx.store.get_object(&resolution.key).await?;
    let size = u64::try_from(data.len()).unwrap_or(u64::MAX);

    let (destination, data) = match &options.target {
        FetchTarget::Directory(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io_with_path(&e, dir))?;
            let path = dir.join(&resolution.filename);
            tokio::fs::write(&path, &data)
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
            tracing::debug!(key = %resolution.key, path = %path.display(), size, "wrote artifact");
            (Some(path), None)
        }
        FetchTarget::Stdout | FetchTarget::Url { .. } => (None, Some(data)),
    };

    Ok(FetchedArtifact {
        requirement: rendered,
        key: resolution.key,
        filename: resolution.filename,
        version: resolution.version.to_string(),
        format: resolution.format,
        size: Some(size),
        destination,
        url: None,
        data,
    })
}
