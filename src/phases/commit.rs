use crate::backend::types::{CommitInfo, CreateCommitRequest, ModuleRef, is_error_status};
use crate::context::Context;
use crate::keys::{self, POM_FILE_NAME};
use crate::models::{AddedDependency, CommitStatus, PomFile, PomFilePatch};
use crate::phases::{PhaseReport, request_failed, skipped};

const COMMITTED_MESSAGE: &str = "Committed file successfully";

/// Commit the files of `files` that are selected for commit onto the
/// pipeline's update branch.
#[tracing::instrument(skip_all, fields(dependency = %pipeline.name, candidates = files.len()))]
pub async fn commit(ctx: &Context, pipeline: &AddedDependency, files: &[PomFile]) -> PhaseReport {
    let commit_message = pipeline.effective_commit_message();
    let commit_info_list: Vec<CommitInfo> = files
        .iter()
        .filter(|f| f.selected_for_commit)
        .map(|f| CommitInfo {
            repository_info: ModuleRef {
                project_name: f.project_name.clone(),
                repo_slug: f.repo_name.clone(),
                module_name: f.module_name.clone(),
            },
            file_name: POM_FILE_NAME.to_string(),
            content: vec![f.content.clone()],
            commit_message: commit_message.clone(),
        })
        .collect();

    if commit_info_list.is_empty() {
        return skipped(ctx, "No files selected for commit.");
    }
    let branch = pipeline.update_file_branch.trim();
    if branch.is_empty() {
        return skipped(ctx, "Missing inputs: Please provide the branch to commit to.");
    }

    let request = CreateCommitRequest {
        commit_info_list,
        branch: branch.to_string(),
    };

    let _busy = ctx.busy();
    let response = match ctx.backend.create_commit(&request).await {
        Ok(response) => response,
        Err(e) => return request_failed(ctx, "Commit", e),
    };

    let mut succeeded = 0;
    let mut failed = 0;
    for result in response.commit_results {
        let patch = if is_error_status(&result.status) {
            failed += 1;
            PomFilePatch {
                commit_status: Some(CommitStatus::Error),
                commit_status_message: Some(result.error.unwrap_or_default()),
                ..Default::default()
            }
        } else {
            succeeded += 1;
            PomFilePatch {
                commit_status: Some(CommitStatus::Committed),
                commit_status_message: Some(COMMITTED_MESSAGE.to_string()),
                ..Default::default()
            }
        };
        let id = keys::pom_file_key(
            &result.project_name,
            &result.repo,
            result.module.as_deref().unwrap_or_default(),
            &pipeline.name,
            POM_FILE_NAME,
        );
        if !ctx.store.update_pom_file(&id, patch) {
            tracing::debug!(file = %id, "commit result for unknown file");
        }
    }

    tracing::info!(succeeded, failed, "commit finished");
    ctx.notifier.success("Commit request successful.");
    PhaseReport::Completed { succeeded, failed }
}
