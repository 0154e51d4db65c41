use crate::error::StoreError;
use crate::storage::client::{ContentClient, NewRepository, RepositoryInfo};

pub const REPOSITORY_DESCRIPTION: &str = "Blog posts created with Blivate";

/// Make sure the backing repository exists, creating it on first use.
///
/// Any failure to fetch the descriptor is treated as "missing" and answered
/// with a create call (public, auto-initialized so the default branch exists).
/// Only a failed create is reported. Cheap enough to call before every
/// multi-step operation, which is what the stores do.
///
/// Every read and write targets `branch`; a repository whose default branch
/// is different (e.g. auto-initialized on `master`) is logged, since writes
/// to a branch that doesn't exist will fail.
pub async fn ensure_collection_exists(
    client: &dyn ContentClient,
    name: &str,
    branch: &str,
) -> Result<(), StoreError> {
    match client.get_repository().await {
        Ok(Some(info)) => {
            warn_on_branch_mismatch(&info, branch);
            return Ok(());
        }
        Ok(None) => tracing::info!("Repository '{name}' not found, creating it"),
        Err(e) => tracing::warn!("Could not fetch repository '{name}' ({e}), trying to create it"),
    }

    let request = NewRepository {
        name: name.to_string(),
        description: REPOSITORY_DESCRIPTION.to_string(),
        private: false,
        auto_init: true,
    };
    let created = client.create_repository(&request).await?;
    tracing::info!("Created repository '{}'", created.full_name);
    warn_on_branch_mismatch(&created, branch);
    Ok(())
}

/// The repository's default branch when it differs from `branch`.
pub fn branch_mismatch<'a>(info: &'a RepositoryInfo, branch: &str) -> Option<&'a str> {
    info.default_branch
        .as_deref()
        .filter(|default_branch| *default_branch != branch)
}

fn warn_on_branch_mismatch(info: &RepositoryInfo, branch: &str) {
    if let Some(default_branch) = branch_mismatch(info, branch) {
        tracing::warn!(
            "Repository '{}' defaults to branch '{default_branch}' but '{branch}' is configured; \
             set `branch = \"{default_branch}\"` if writes fail",
            info.full_name
        );
    }
}
