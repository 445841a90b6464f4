use crate::context::Context;
use crate::models::DependencyStatus;
use crate::pipeline::lifecycle::add_pipeline;

/// Fetch the supported-dependency catalog. Names that already have a
/// pipeline stay marked as added.
pub async fn sync_catalog(ctx: &Context) -> bool {
    let _busy = ctx.busy();
    match ctx.backend.get_supported_dependencies().await {
        Ok(names) => {
            tracing::info!(count = names.len(), "supported dependencies fetched");
            ctx.store.set_supported_dependencies(names);
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "fetching supported dependencies failed");
            ctx.notifier
                .error(&format!("Failed to fetch supported dependencies. {}", e));
            false
        }
    }
}

/// Flip a catalog entry between checked and can-be-added.
pub fn toggle_dependency(ctx: &Context, name: &str) {
    ctx.store.toggle_dependency_status(name);
}

/// Add a pipeline for every checked dependency, one after another.
/// Returns the ids of the pipelines that were added.
pub async fn add_checked_pipelines(ctx: &Context) -> Vec<String> {
    let checked: Vec<String> = ctx
        .store
        .dependencies()
        .supported_dependencies
        .iter()
        .filter(|d| d.status == DependencyStatus::Checked)
        .map(|d| d.name.clone())
        .collect();

    let mut added = Vec::new();
    for name in checked {
        if let Some(id) = add_pipeline(ctx, &name).await {
            added.push(id);
        }
    }
    added
}
