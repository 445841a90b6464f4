use std::time::Duration;

use crate::backend::types::{BuildRequestItem, PullRequestBuildsRequest, RepoRef};
use crate::context::Context;
use crate::models::{AddedDependency, RepositoryPatch};
use crate::phases::PhaseReport;
use crate::poller::{PollHandle, start_polling};

/// Fetch build counts for every repository of the pipeline that has an open
/// pull request. Runs on a timer, so outcomes are logged rather than notified.
#[tracing::instrument(skip_all, fields(dependency = %pipeline.name))]
pub async fn fetch_builds(ctx: &Context, pipeline: &AddedDependency) -> PhaseReport {
    let request_items: Vec<BuildRequestItem> = ctx
        .store
        .repositories_for(&pipeline.id)
        .iter()
        .filter_map(|r| {
            r.pr_id.as_ref().map(|pr_id| BuildRequestItem {
                repository: RepoRef::new(&r.project_name, &r.repo_name),
                pr_id: pr_id.clone(),
            })
        })
        .collect();

    if request_items.is_empty() {
        tracing::debug!("no pull requests to fetch builds for");
        return PhaseReport::Skipped {
            reason: "No repositories with PRs to fetch build statuses.".to_string(),
        };
    }

    let request = PullRequestBuildsRequest { request_items };
    let response = match ctx.backend.get_pull_request_builds(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "fetching build statuses failed");
            return PhaseReport::RequestFailed {
                message: e.to_string(),
            };
        }
    };

    let mut succeeded = 0;
    let mut failed = 0;
    for build in response.pull_request_builds {
        let Some(summary) = build.first_summary() else {
            failed += 1;
            continue;
        };
        succeeded += 1;
        ctx.store.update_repository_by_attributes(
            &pipeline.id,
            &build.project_name,
            &build.repo_slug,
            RepositoryPatch {
                build: Some(summary),
                ..Default::default()
            },
        );
    }

    tracing::debug!(succeeded, failed, "build statuses refreshed");
    PhaseReport::Completed { succeeded, failed }
}

/// Poll build statuses for a pipeline until the handle is stopped. The
/// pipeline is re-read on every tick; ticks after it is removed do nothing.
pub fn watch_builds(ctx: Context, pipeline_id: String, interval: Duration) -> PollHandle {
    start_polling(interval, move || {
        let ctx = ctx.clone();
        let pipeline_id = pipeline_id.clone();
        async move {
            match ctx.store.pipeline(&pipeline_id) {
                Some(pipeline) => {
                    fetch_builds(&ctx, &pipeline).await;
                }
                None => tracing::debug!(pipeline = %pipeline_id, "pipeline gone, skipping build poll"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BuildSummary;
    use crate::test_support::{harness, seed_log4j};
    use serde_json::json;

    fn open_pull_request(ctx: &Context, pipeline: &AddedDependency, repo: &str, pr_id: &str) {
        ctx.store.update_repository_by_attributes(
            &pipeline.id,
            "TEAM",
            repo,
            RepositoryPatch {
                pr_id: Some(pr_id.to_string()),
                ..Default::default()
            },
        );
    }

    #[tokio::test]
    async fn test_no_pull_requests_means_no_call() {
        let h = harness();
        let pipeline = seed_log4j(&h.ctx.store);
        let before = h.ctx.store.snapshot();

        let report = fetch_builds(&h.ctx, &pipeline).await;
        assert!(matches!(report, PhaseReport::Skipped { .. }));
        assert!(h.backend.calls().is_empty());
        assert!(h.notifier.all().is_empty());
        assert!(std::sync::Arc::ptr_eq(
            &before.dependent_repositories,
            &h.ctx.store.dependent_repositories()
        ));
    }

    #[tokio::test]
    async fn test_build_counts_come_from_first_commit() {
        let h = harness();
        let pipeline = seed_log4j(&h.ctx.store);
        open_pull_request(&h.ctx, &pipeline, "service-a", "17");
        h.backend.respond(
            "get_pull_request_builds",
            json!({"pullRequestBuilds": [
                {"repoSlug": "service-a", "projectName": "TEAM", "buildData": {
                    "c0ffee": {"cancelled": 0, "successful": 3, "inProgress": 1, "failed": 0, "unknown": 0},
                    "bada55": {"cancelled": 5, "successful": 0, "inProgress": 0, "failed": 5, "unknown": 0}
                }},
            ]}),
        );

        let report = fetch_builds(&h.ctx, &pipeline).await;
        assert_eq!(
            report,
            PhaseReport::Completed {
                succeeded: 1,
                failed: 0
            }
        );
        let request = &h.backend.calls_to("get_pull_request_builds")[0];
        assert_eq!(
            request["requestItems"],
            json!([{"repository": {"projectName": "TEAM", "repoSlug": "service-a"}, "prId": "17"}])
        );
        let repos = h.ctx.store.repositories_for(&pipeline.id);
        let a = repos.iter().find(|r| r.repo_name == "service-a").unwrap();
        assert_eq!(
            a.build,
            Some(BuildSummary {
                successful: 3,
                in_progress: 1,
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn test_failure_is_silent() {
        let h = harness();
        let pipeline = seed_log4j(&h.ctx.store);
        open_pull_request(&h.ctx, &pipeline, "service-b", "9");
        h.backend.fail("get_pull_request_builds", 500);

        let report = fetch_builds(&h.ctx, &pipeline).await;
        assert!(matches!(report, PhaseReport::RequestFailed { .. }));
        assert!(h.notifier.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_polls_until_stopped() {
        let h = harness();
        let pipeline = seed_log4j(&h.ctx.store);
        open_pull_request(&h.ctx, &pipeline, "service-a", "17");
        h.backend
            .always("get_pull_request_builds", json!({"pullRequestBuilds": []}));

        let handle = watch_builds(h.ctx.clone(), pipeline.id.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(15)).await;
        handle.stop();
        assert_eq!(h.backend.calls_to("get_pull_request_builds").len(), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.backend.calls_to("get_pull_request_builds").len(), 2);
    }
}
