use crate::backend::types::{GetBranchesRequest, RepoRef};
use crate::context::Context;
use crate::errors::BackendError;
use crate::keys;
use crate::models::{AddedDependency, DependentApplication, DependentRepository, VersionOption};

/// Load a dependency's versions, dependent applications and their branch
/// lists, and store the assembled pipeline. Returns the new pipeline id.
///
/// Nothing is stored unless every request succeeds. A dependency has at most
/// one pipeline, since repository ids are derived from the dependency name.
#[tracing::instrument(skip(ctx))]
pub async fn add_pipeline(ctx: &Context, name: &str) -> Option<String> {
    let existing = ctx
        .store
        .dependencies()
        .added_dependencies
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.id.clone());
    if let Some(existing) = existing {
        tracing::warn!(pipeline = %existing, "dependency already has a pipeline");
        ctx.notifier.error(&format!(
            "Dependency '{}' already has a pipeline ({}). Refresh or remove it instead.",
            name, existing
        ));
        return None;
    }

    let _busy = ctx.busy();
    let fail = |e: BackendError| {
        tracing::warn!(error = %e, "loading dependency failed");
        ctx.notifier
            .error(&format!("Failed to load dependency '{}'. {}", name, e));
    };

    let metadata = match ctx.backend.get_dependent_apps_and_versions(name).await {
        Ok(metadata) => metadata,
        Err(e) => {
            fail(e);
            return None;
        }
    };

    let versions = metadata
        .versions
        .into_iter()
        .map(|v| VersionOption { name: v.into_name() })
        .collect();
    let pipeline = AddedDependency::new(name, versions);

    let mut repositories: Vec<DependentRepository> = Vec::new();
    for app in metadata.applications {
        let repo_id = keys::repository_key(&app.project, &app.application, name);
        let idx = match repositories.iter().position(|r| r.id == repo_id) {
            Some(idx) => idx,
            None => {
                repositories.push(DependentRepository::new(
                    &app.project,
                    &app.application,
                    name,
                    &pipeline.id,
                ));
                repositories.len() - 1
            }
        };
        let module = app.module_name.unwrap_or_default();
        let application = DependentApplication::new(&app.project, &app.application, &module, name);
        let apps = &mut repositories[idx].dependent_applications;
        if !apps.iter().any(|a| a.id == application.id) {
            apps.push(application);
        }
    }

    if !repositories.is_empty() {
        let request = GetBranchesRequest {
            repo_list: repositories
                .iter()
                .map(|r| RepoRef::new(&r.project_name, &r.repo_name))
                .collect(),
        };
        let branches = match ctx.backend.get_branches(&request).await {
            Ok(branches) => branches,
            Err(e) => {
                fail(e);
                return None;
            }
        };
        for mut entry in branches.branches_data {
            let id = keys::repository_key(&entry.project_name, &entry.repository, name);
            let Some(repo) = repositories.iter_mut().find(|r| r.id == id) else {
                continue;
            };
            match entry.error.take() {
                Some(error) => {
                    repo.error = Some(error);
                    repo.branches.clear();
                }
                None => repo.branches = entry.branch_list(),
            }
        }
    }

    let id = pipeline.id.clone();
    tracing::info!(
        pipeline = %id,
        repositories = repositories.len(),
        "dependency pipeline added"
    );
    ctx.store.insert_pipeline(pipeline, repositories);
    ctx.notifier
        .success(&format!("Dependency '{}' loaded successfully.", name));
    Some(id)
}

/// Remove a pipeline and everything that belongs to it. Idempotent.
pub fn remove_pipeline(ctx: &Context, id: &str) -> bool {
    let removed = ctx.store.remove_pipeline_cascade(id);
    if removed {
        tracing::info!(pipeline = %id, "dependency pipeline removed");
    }
    removed
}

/// Remove and re-add a pipeline by name. This is the only way out of a
/// latched individual-mode lock. Returns the new pipeline id.
pub async fn refresh_pipeline(ctx: &Context, id: &str) -> Option<String> {
    let Some(pipeline) = ctx.store.pipeline(id) else {
        ctx.notifier.error("Pipeline not found.");
        return None;
    };
    remove_pipeline(ctx, id);
    add_pipeline(ctx, &pipeline.name).await
}
