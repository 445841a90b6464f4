//! Branch-actions workspace: ad-hoc branch and pull request creation across
//! arbitrary repositories of a set of projects, outside any pipeline.

use std::time::Duration;

use crate::backend::types::{
    BuildRequestItem, CreateBranchesRequest, CreatePullRequestsRequest, GetRepositoriesRequest,
    PullRequestBuildsRequest, PullRequestInfo, RepoRef, is_error_status,
};
use crate::context::Context;
use crate::models::{
    BranchActionsData, Project, WorkspaceEdit, WorkspaceRepository, WorkspaceRepositoryPatch,
};
use crate::phases::{PhaseReport, request_failed, skipped};
use crate::poller::{PollHandle, start_polling};

impl BranchActionsData {
    /// Add (or replace) a project and take it off the supported list.
    pub fn add_project(&mut self, project: Project) {
        self.projects.retain(|p| p.name != project.name);
        self.supported_projects.retain(|name| *name != project.name);
        self.projects.push(project);
    }

    pub fn remove_project(&mut self, name: &str) {
        self.projects.retain(|p| p.name != name);
        if !self.supported_projects.iter().any(|p| p == name) {
            self.supported_projects.push(name.to_string());
        }
    }

    fn project_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.name == name)
    }

    /// Move a repository between the available and selected lists.
    /// Returns `false` if neither list has it.
    pub fn toggle_repository_selection(&mut self, project: &str, repo: &str) -> bool {
        let Some(project) = self.project_mut(project) else {
            return false;
        };
        if let Some(idx) = project.selected_repositories.iter().position(|r| r.name == repo) {
            let mut moved = project.selected_repositories.remove(idx);
            moved.selected = false;
            project.repositories.push(moved);
            return true;
        }
        if let Some(idx) = project.repositories.iter().position(|r| r.name == repo) {
            let mut moved = project.repositories.remove(idx);
            moved.selected = true;
            project.selected_repositories.push(moved);
            return true;
        }
        false
    }

    pub fn select_repositories(&mut self, project: &str, names: &[String]) {
        let Some(project) = self.project_mut(project) else {
            return;
        };
        let (mut chosen, rest): (Vec<_>, Vec<_>) = project
            .repositories
            .drain(..)
            .partition(|r| names.contains(&r.name));
        project.repositories = rest;
        for repo in &mut chosen {
            repo.selected = true;
        }
        project.selected_repositories.extend(chosen);
    }

    pub fn deselect_repository(&mut self, project: &str, repo: &str) {
        let Some(project) = self.project_mut(project) else {
            return;
        };
        if let Some(idx) = project.selected_repositories.iter().position(|r| r.name == repo) {
            let mut moved = project.selected_repositories.remove(idx);
            moved.selected = false;
            project.repositories.push(moved);
        }
    }

    /// Merge `patch` into the named repository, looking in the available
    /// list first and then the selected list.
    pub fn update_repository(&mut self, project: &str, repo: &str, patch: WorkspaceRepositoryPatch) -> bool {
        let Some(project) = self.project_mut(project) else {
            return false;
        };
        let target = match project.repositories.iter_mut().find(|r| r.name == repo) {
            Some(target) => Some(target),
            None => project.selected_repositories.iter_mut().find(|r| r.name == repo),
        };
        match target {
            Some(target) => {
                patch.apply(target);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, edit: WorkspaceEdit) {
        match edit {
            WorkspaceEdit::FromBranch(v) => self.from_branch = v,
            WorkspaceEdit::NewBranch(v) => self.new_branch = v,
            WorkspaceEdit::PrFromBranch(v) => self.pr_from_branch = v,
            WorkspaceEdit::PrToBranch(v) => self.pr_to_branch = v,
            WorkspaceEdit::PrTitle(v) => self.pr_title = v,
            WorkspaceEdit::PrDescription(v) => self.pr_description = v,
        }
    }

    /// Every selected repository of every project.
    pub fn selected_refs(&self) -> Vec<RepoRef> {
        self.projects
            .iter()
            .flat_map(|p| {
                p.selected_repositories
                    .iter()
                    .map(move |r| RepoRef::new(&p.name, &r.name))
            })
            .collect()
    }
}

/// Fetch a project's repository names and add it to the workspace with
/// nothing selected.
pub async fn add_project(ctx: &Context, name: &str) -> bool {
    let _busy = ctx.busy();
    let request = GetRepositoriesRequest {
        project_name: name.to_string(),
    };
    match ctx.backend.get_repositories(&request).await {
        Ok(response) => {
            let project = Project {
                name: name.to_string(),
                repositories: response
                    .applications
                    .iter()
                    .map(|n| WorkspaceRepository::named(n))
                    .collect(),
                selected_repositories: Vec::new(),
            };
            tracing::info!(project = %name, repositories = project.repositories.len(), "project added");
            ctx.store.update_workspace(|ws| ws.add_project(project));
            ctx.notifier
                .success("Fetched repositories names successfully.");
            true
        }
        Err(e) => {
            tracing::warn!(project = %name, error = %e, "fetching repositories failed");
            ctx.notifier
                .error(&format!("Failed to fetch repositories. {}", e));
            false
        }
    }
}

pub fn remove_project(ctx: &Context, name: &str) {
    ctx.store.update_workspace(|ws| ws.remove_project(name));
}

pub fn toggle_repository(ctx: &Context, project: &str, repo: &str) -> bool {
    ctx.store
        .update_workspace(|ws| ws.toggle_repository_selection(project, repo))
}

pub fn edit_workspace(ctx: &Context, edit: WorkspaceEdit) {
    ctx.store.update_workspace(|ws| ws.apply(edit));
}

/// Create `new_branch` from `from_branch` in every selected repository.
#[tracing::instrument(skip_all)]
pub async fn create_branches(ctx: &Context) -> PhaseReport {
    let ws = ctx.store.branch_actions();
    let repo_list = ws.selected_refs();
    if repo_list.is_empty() {
        return skipped(ctx, "No repositories selected.");
    }
    if ws.new_branch.trim().is_empty() || ws.from_branch.trim().is_empty() {
        return skipped(
            ctx,
            "Missing inputs: Please provide a new branch name and a source branch.",
        );
    }

    let request = CreateBranchesRequest {
        repo_list,
        branch_name: ws.new_branch.trim().to_string(),
        start_point: ws.from_branch.trim().to_string(),
    };
    let _busy = ctx.busy();
    let response = match ctx.backend.create_branches(&request).await {
        Ok(response) => response,
        Err(e) => return request_failed(ctx, "Create branches", e),
    };

    let mut succeeded = 0;
    let mut failed = 0;
    ctx.store.update_workspace(|ws| {
        for result in response.branch_results {
            if is_error_status(&result.status) {
                failed += 1;
            } else {
                succeeded += 1;
            }
            ws.update_repository(
                &result.project_name,
                &result.repo,
                WorkspaceRepositoryPatch {
                    create_branches_status: Some(result.status),
                    create_branches_message: result.message,
                    ..Default::default()
                },
            );
        }
    });

    tracing::info!(succeeded, failed, "workspace branches created");
    ctx.notifier.success("Create branches request successful.");
    PhaseReport::Completed { succeeded, failed }
}

/// Open pull requests from `pr_from_branch` into `pr_to_branch` in every
/// selected repository.
#[tracing::instrument(skip_all)]
pub async fn create_pull_requests(ctx: &Context) -> PhaseReport {
    let ws = ctx.store.branch_actions();
    let repo_info_list = ws.selected_refs();
    if repo_info_list.is_empty() {
        return skipped(ctx, "No repositories selected.");
    }
    if ws.pr_from_branch.trim().is_empty() || ws.pr_to_branch.trim().is_empty() {
        return skipped(
            ctx,
            "Missing inputs: Please provide source and target branches for the pull requests.",
        );
    }

    let request = CreatePullRequestsRequest {
        pr_info_list: vec![PullRequestInfo {
            repo_info_list,
            from_branch: ws.pr_from_branch.trim().to_string(),
            to_branch: ws.pr_to_branch.trim().to_string(),
            title: ws.pr_title.clone(),
            description: ws.pr_description.clone(),
        }],
    };
    let _busy = ctx.busy();
    let response = match ctx.backend.create_pull_requests(&request).await {
        Ok(response) => response,
        Err(e) => return request_failed(ctx, "Pull requests creation", e),
    };

    let mut succeeded = 0;
    let mut failed = 0;
    ctx.store.update_workspace(|ws| {
        for result in response.create_pull_request_results {
            if is_error_status(&result.status) {
                failed += 1;
            } else {
                succeeded += 1;
            }
            let created = result.result.as_ref();
            ws.update_repository(
                &result.project_name,
                &result.repo,
                WorkspaceRepositoryPatch {
                    create_pull_request_status: Some(result.status.clone()),
                    create_pull_request_message: result.message.clone(),
                    pull_request_link: created.and_then(|pr| pr.self_href()).map(str::to_string),
                    pr_id: created.and_then(|pr| pr.id_string()),
                    ..Default::default()
                },
            );
        }
    });

    tracing::info!(succeeded, failed, "workspace pull requests created");
    ctx.notifier.success(&format!(
        "Pull requests created successfully in {} repo(s).",
        succeeded
    ));
    PhaseReport::Completed { succeeded, failed }
}

/// Refresh build counts for the project's repositories that have a pull request.
#[tracing::instrument(skip(ctx))]
pub async fn fetch_builds(ctx: &Context, project: &str) -> PhaseReport {
    let ws = ctx.store.branch_actions();
    let request_items: Vec<BuildRequestItem> = ws
        .projects
        .iter()
        .filter(|p| p.name == project)
        .flat_map(|p| p.repositories.iter().chain(p.selected_repositories.iter()))
        .filter_map(|r| {
            r.pr_id.as_ref().map(|pr_id| BuildRequestItem {
                repository: RepoRef::new(project, &r.name),
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
    ctx.store.update_workspace(|ws| {
        for build in response.pull_request_builds {
            let Some(summary) = build.first_summary() else {
                failed += 1;
                continue;
            };
            succeeded += 1;
            ws.update_repository(
                &build.project_name,
                &build.repo_slug,
                WorkspaceRepositoryPatch {
                    build: Some(summary),
                    ..Default::default()
                },
            );
        }
    });
    PhaseReport::Completed { succeeded, failed }
}

pub fn watch_builds(ctx: Context, project: String, interval: Duration) -> PollHandle {
    start_polling(interval, move || {
        let ctx = ctx.clone();
        let project = project.clone();
        async move {
            fetch_builds(&ctx, &project).await;
        }
    })
}
