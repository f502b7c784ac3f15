//! Bucket listing

use wheelhouse_errors::Error;
use wheelhouse_events::EventEmitter;
use wheelhouse_resolver::list_releases as releases_of;
use wheelhouse_types::Requirement;

use crate::{OpsCtx, ReleaseInfo};

/// Every project with at least one stored artifact, sorted
///
/// # Errors
///
/// Returns an error if the store cannot be listed.
pub async fn list_projects(ctx: &OpsCtx) -> Result<Vec<String>, Error> {
    ctx.emit_operation_started("list");
    let keys = ctx.store.list_objects().await?;
    let projects = wheelhouse_resolver::list_projects(&keys);
    ctx.emit_debug(format!(
        "{} projects across {} keys",
        projects.len(),
        keys.len()
    ));
    ctx.emit_operation_completed("list", true);
    Ok(projects)
}

/// Releases matching each requirement, newest first per requirement
///
/// Stops at the first requirement that does not parse.
///
/// # Errors
///
/// Returns an error if a requirement is malformed or the store cannot be listed.
pub async fn list_releases(ctx: &OpsCtx, requirements: &[String]) -> Result<Vec<ReleaseInfo>, Error> {
    ctx.emit_operation_started("list");
    let keys = ctx.store.list_objects().await?;

    let mut listed = Vec::new();
    for input in requirements {
        let requirement: Requirement = match input.parse() {
            Ok(requirement) => requirement,
            Err(e) => {
                let error = Error::from(e);
                ctx.emit_operation_failed("list", &error);
                return Err(error);
            }
        };
        let releases = releases_of(&requirement, &keys);
        tracing::debug!(requirement = %requirement, releases = releases.len(), "listed releases");
        listed.extend(
            releases
                .iter()
                .map(|release| ReleaseInfo::from_release(&requirement.project, release)),
        );
    }

    ctx.emit_operation_completed("list", true);
    Ok(listed)
}
