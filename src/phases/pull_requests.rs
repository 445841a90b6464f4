use crate::backend::types::{CreatePullRequestsRequest, PullRequestInfo, RepoRef, is_error_status};
use crate::context::Context;
use crate::models::{AddedDependency, RepositoryPatch};
use crate::phases::{PhaseReport, request_failed, skipped};

/// Open one pull request per selected, usable repository from
/// `pr_from_branch` into `to_branch`.
#[tracing::instrument(skip_all, fields(dependency = %pipeline.name))]
pub async fn create_pull_requests(ctx: &Context, pipeline: &AddedDependency) -> PhaseReport {
    let from_branch = pipeline.pr_from_branch.trim();
    let to_branch = pipeline.to_branch.trim();
    if from_branch.is_empty() || to_branch.is_empty() {
        return skipped(
            ctx,
            "Missing inputs: Please provide source and target branches for the pull requests.",
        );
    }

    let repo_info_list: Vec<RepoRef> = ctx
        .store
        .repositories_for(&pipeline.id)
        .iter()
        .filter(|r| r.create_pull_requests && r.is_usable())
        .map(|r| RepoRef::new(&r.project_name, &r.repo_name))
        .collect();
    if repo_info_list.is_empty() {
        return skipped(ctx, "No repositories selected for pull requests.");
    }

    let request = CreatePullRequestsRequest {
        pr_info_list: vec![PullRequestInfo {
            repo_info_list,
            from_branch: from_branch.to_string(),
            to_branch: to_branch.to_string(),
            title: pipeline.pull_request_title.clone(),
            description: pipeline.pull_request_description.clone(),
        }],
    };

    let _busy = ctx.busy();
    let response = match ctx.backend.create_pull_requests(&request).await {
        Ok(response) => response,
        Err(e) => return request_failed(ctx, "Pull requests creation", e),
    };

    let mut succeeded = 0;
    let mut failed = 0;
    for result in response.create_pull_request_results {
        if is_error_status(&result.status) {
            failed += 1;
        } else {
            succeeded += 1;
        }
        let created = result.result.as_ref();
        let patch = RepositoryPatch {
            create_pull_requests_status: Some(result.status.clone()),
            create_pull_requests_message: Some(result.message.clone().unwrap_or_default()),
            pr_link: Some(
                created
                    .and_then(|pr| pr.self_href())
                    .unwrap_or_default()
                    .to_string(),
            ),
            pr_id: created.and_then(|pr| pr.id_string()),
            ..Default::default()
        };
        ctx.store.update_repository_by_attributes(
            &pipeline.id,
            &result.project_name,
            &result.repo,
            patch,
        );
    }

    tracing::info!(succeeded, failed, "create pull requests finished");
    ctx.notifier.success(&format!(
        "Pull requests created successfully in {} repo(s).",
        succeeded
    ));
    PhaseReport::Completed { succeeded, failed }
}
