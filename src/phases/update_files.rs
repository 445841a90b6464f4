use crate::backend::types::{ModuleRef, UpdateDependencyRequest};
use crate::context::Context;
use crate::keys::{self, POM_FILE_NAME};
use crate::models::{AddedDependency, ApplicationPatch, PomFile};
use crate::phases::{PhaseReport, request_failed, skipped};

/// Rewrite the build descriptor of every selected application to the
/// pipeline's selected version.
///
/// Returns the files produced by this run alongside the report. A per-item
/// error removes any stale file stored for that application.
#[tracing::instrument(skip_all, fields(dependency = %pipeline.name))]
pub async fn update_files(ctx: &Context, pipeline: &AddedDependency) -> (PhaseReport, Vec<PomFile>) {
    let repo_list: Vec<ModuleRef> = ctx
        .store
        .repositories_for(&pipeline.id)
        .iter()
        .filter(|r| r.is_usable())
        .flat_map(|r| r.dependent_applications.iter())
        .filter(|app| app.update_dependency_version)
        .map(|app| ModuleRef {
            project_name: app.project_name.clone(),
            repo_slug: app.repo_name.clone(),
            module_name: app.module_name.clone(),
        })
        .collect();

    let branch = pipeline.update_file_branch.trim();
    if repo_list.is_empty() || pipeline.selected_version.is_empty() || branch.is_empty() {
        let report = skipped(
            ctx,
            "Missing inputs: Please select applications, version, and branch.",
        );
        return (report, Vec::new());
    }

    let request = UpdateDependencyRequest {
        repo_list,
        branch_name: branch.to_string(),
        dependency: pipeline.name.clone(),
        version: pipeline.selected_version.clone(),
    };

    let _busy = ctx.busy();
    let response = match ctx.backend.update_dependency_version(&request).await {
        Ok(response) => response,
        Err(e) => {
            return (
                request_failed(ctx, "Dependency versions update", e),
                Vec::new(),
            );
        }
    };

    let mut produced = Vec::new();
    let mut failed = 0;
    let returned = response.updated_results.len();
    for result in response.updated_results {
        let file_id = keys::pom_file_key(
            &result.project_name,
            &result.repo,
            result.module_name(),
            &pipeline.name,
            POM_FILE_NAME,
        );
        let app_id =
            keys::application_key(&result.project_name, &result.repo, result.module_name(), &pipeline.name);
        let repo_id = keys::repository_key(&result.project_name, &result.repo, &pipeline.name);

        if result.is_error() {
            failed += 1;
            ctx.store.remove_pom_file(&file_id);
        } else {
            let file = PomFile::new(
                pipeline,
                &result.project_name,
                &result.repo,
                result.module_name(),
                result.file_name.as_deref(),
                result.joined_content(),
            );
            ctx.store.upsert_pom_file(file.clone());
            produced.push(file);
        }

        ctx.store.update_application(
            &repo_id,
            &app_id,
            ApplicationPatch {
                pom_file_id: Some(file_id),
                update_status: Some(result.status.clone()),
                update_message: Some(result.status_message()),
                ..Default::default()
            },
        );
    }

    if returned == 0 {
        ctx.notifier.info("No updates were made.");
    } else {
        ctx.notifier
            .success("Dependency versions update request successful.");
    }
    tracing::info!(updated = produced.len(), failed, "update files finished");

    let report = PhaseReport::Completed {
        succeeded: produced.len(),
        failed,
    };
    (report, produced)
}
