use std::collections::HashSet;

use crate::backend::types::{CreateBranchesRequest, GetBranchesRequest, RepoRef, is_error_status};
use crate::context::Context;
use crate::keys;
use crate::models::{AddedDependency, RepositoryPatch};
use crate::phases::{PhaseReport, request_failed, skipped};

/// Create `new_branch` from `from_branch` in every selected, usable repository,
/// then refresh the branch lists of the repositories where it succeeded.
#[tracing::instrument(skip_all, fields(dependency = %pipeline.name))]
pub async fn create_branches(ctx: &Context, pipeline: &AddedDependency) -> PhaseReport {
    let new_branch = pipeline.new_branch.trim();
    let from_branch = pipeline.from_branch.trim();
    if new_branch.is_empty() || from_branch.is_empty() {
        return skipped(
            ctx,
            "Missing inputs: Please provide a new branch name and a source branch.",
        );
    }

    let repo_list: Vec<RepoRef> = ctx
        .store
        .repositories_for(&pipeline.id)
        .iter()
        .filter(|r| r.create_branches && r.is_usable())
        .map(|r| RepoRef::new(&r.project_name, &r.repo_name))
        .collect();
    if repo_list.is_empty() {
        return skipped(ctx, "No repositories selected for branch creation.");
    }

    let request = CreateBranchesRequest {
        repo_list,
        branch_name: new_branch.to_string(),
        start_point: from_branch.to_string(),
    };

    let _busy = ctx.busy();
    let response = match ctx.backend.create_branches(&request).await {
        Ok(response) => response,
        Err(e) => return request_failed(ctx, "Create branches", e),
    };

    let mut succeeded = 0;
    let mut failed = 0;
    let mut refresh: Vec<RepoRef> = Vec::new();
    let mut seen = HashSet::new();
    for result in response.branch_results {
        if is_error_status(&result.status) {
            failed += 1;
        } else {
            succeeded += 1;
            if seen.insert((result.project_name.clone(), result.repo.clone())) {
                refresh.push(RepoRef::new(&result.project_name, &result.repo));
            }
        }
        let id = keys::repository_key(&result.project_name, &result.repo, &pipeline.name);
        ctx.store.update_repository(
            &id,
            RepositoryPatch {
                create_branches_status: Some(result.status),
                create_branches_message: Some(result.message.unwrap_or_default()),
                ..Default::default()
            },
        );
    }

    if !refresh.is_empty() {
        match ctx
            .backend
            .get_branches(&GetBranchesRequest { repo_list: refresh })
            .await
        {
            Ok(data) => {
                for entry in data.branches_data.into_iter().filter(|d| d.error.is_none()) {
                    let id =
                        keys::repository_key(&entry.project_name, &entry.repository, &pipeline.name);
                    ctx.store.update_repository(
                        &id,
                        RepositoryPatch {
                            branches: Some(entry.branch_list()),
                            ..Default::default()
                        },
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh branch lists");
                ctx.notifier
                    .warning(&format!("Branches created, but refreshing branch lists failed. {}", e));
            }
        }
    }

    tracing::info!(succeeded, failed, "create branches finished");
    ctx.notifier.success("Create branches request successful.");
    PhaseReport::Completed { succeeded, failed }
}
