//! Integration tests for depflow
//!
//! The CLI is driven through `assert_cmd` against a throwaway state directory.
//! Library flows run against `FakeScm`, an in-memory source control backend.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a depflow Command isolated from the caller's environment
fn depflow(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("depflow");
    cmd.current_dir(dir.path())
        .env("DEPFLOW_STATE_DIR", dir.path().join("state"))
        .env("DEPFLOW_API_BASE_URL", "http://127.0.0.1:9")
        .env_remove("DEPFLOW_USERNAME")
        .env_remove("DEPFLOW_TOKEN")
        .env_remove("RUST_LOG")
        .arg("--quiet");
    cmd
}

fn pipeline_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "selectedVersion": "2.17.0",
        "versions": [{"name": "2.17.0"}, {"name": "2.18.0"}],
        "fromBranch": "develop",
        "newBranch": "",
        "prFromBranch": "",
        "toBranch": "develop",
        "updateFileBranch": "",
        "executeAll": false,
        "isOpen": false,
        "isDependentApplicationsOpen": false,
        "isCreateBranchesOpen": false,
        "isUpdateFilesOpen": false,
        "isCreatePullRequestsOpen": false,
        "isPullRequestLinksOpen": false,
        "commitMessage": "",
        "pullRequestTitle": "",
        "pullRequestDescription": "",
        "individualModeExecuted": false
    })
}

/// Seed a persisted state directory holding one `log4j` pipeline.
fn seed_state(dir: &TempDir) {
    let state = dir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    let deps = serde_json::json!({
        "supportedDependencies": [{"name": "log4j", "status": "none"}],
        "addedDependencies": [pipeline_json("p-1", "log4j")]
    });
    fs::write(state.join("dependenciesState.json"), deps.to_string()).unwrap();
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_depflow_help() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("pipeline"))
            .stdout(predicate::str::contains("workspace"));
    }

    #[test]
    fn test_depflow_version() {
        let dir = TempDir::new().unwrap();
        depflow(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_empty_state_lists_nothing() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .args(["pipeline", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No pipelines"));
        depflow(&dir)
            .args(["deps", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Catalog is empty"));
    }

    #[test]
    fn test_workspace_defaults() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .args(["workspace", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("develop -> feature/"))
            .stdout(predicate::str::contains("E-OP"));
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let dir = TempDir::new().unwrap();
        seed_state(&dir);
        depflow(&dir)
            .args(["pipeline", "run", "log4j", "deploy"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid phase"));
    }

    #[test]
    fn test_unknown_pipeline_is_rejected() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .args(["pipeline", "show", "nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No pipeline with id or name 'nope'"));
    }

    #[test]
    fn test_unreachable_backend_reports_failure() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .args(["deps", "sync"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to fetch supported dependencies"));
    }
}

// =============================================================================
// Persisted State Tests
// =============================================================================

mod persisted_state {
    use super::*;

    #[test]
    fn test_edits_persist_between_invocations() {
        let dir = TempDir::new().unwrap();
        seed_state(&dir);

        depflow(&dir)
            .args(["pipeline", "ticket", "log4j", "OPS-12"])
            .assert()
            .success();
        depflow(&dir)
            .args(["pipeline", "version", "p-1", "2.18.0"])
            .assert()
            .success();

        depflow(&dir)
            .args(["pipeline", "show", "log4j"])
            .assert()
            .success()
            .stdout(predicate::str::contains("feature/OPS-12"))
            .stdout(predicate::str::contains("Upgrade log4j to 2.18.0"));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        seed_state(&dir);
        depflow(&dir)
            .args(["pipeline", "version", "log4j", "9.9.9"])
            .assert()
            .failure();
    }

    #[test]
    fn test_execute_all_mode_blocks_individual_phases() {
        let dir = TempDir::new().unwrap();
        seed_state(&dir);

        depflow(&dir)
            .args(["pipeline", "mode", "log4j", "execute-all"])
            .assert()
            .success();
        depflow(&dir)
            .args(["pipeline", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("execute-all"));
        depflow(&dir)
            .args(["pipeline", "run", "log4j", "commit"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("execute-all mode"));
    }

    #[test]
    fn test_reset_force_clears_state() {
        let dir = TempDir::new().unwrap();
        seed_state(&dir);

        depflow(&dir)
            .args(["reset", "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Reset complete"));
        assert!(!dir.path().join("state/dependenciesState.json").exists());
        depflow(&dir)
            .args(["pipeline", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No pipelines"));
    }

    #[test]
    fn test_corrupt_state_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        fs::create_dir_all(&state).unwrap();
        fs::write(state.join("dependenciesState.json"), "{not json").unwrap();

        depflow(&dir)
            .args(["pipeline", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No pipelines"));
    }
}

// =============================================================================
// Configuration Tests
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_init_then_validate() {
        let dir = TempDir::new().unwrap();
        depflow(&dir).args(["config", "init"]).assert().success();
        assert!(dir.path().join("depflow.toml").exists());

        depflow(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("depflow.toml"),
            "[polling]\ninterval_secs = 0\n",
        )
        .unwrap();

        depflow(&dir)
            .args(["config", "validate"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("interval_secs"));
    }

    #[test]
    fn test_config_show_reflects_overrides() {
        let dir = TempDir::new().unwrap();
        depflow(&dir)
            .args(["--base-url", "https://scm.example/", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("base_url = \"https://scm.example\""));
    }
}

// =============================================================================
// Library Flows
// =============================================================================

mod flows {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};

    use depflow::backend::Backend;
    use depflow::backend::types::*;
    use depflow::context::Context;
    use depflow::errors::BackendError;
    use depflow::models::{CommitStatus, DependencyStatus, WorkspaceEdit};
    use depflow::phases::{self, Phase, PhaseReport};
    use depflow::pipeline::{self, ExecuteAll, ExecutionState};
    use depflow::session;
    use depflow::store::{FileStorage, Store};
    use depflow::ui::{Level, NoopLoader, Notification, Notifier};
    use depflow::workspace;

    fn reply<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
        serde_json::from_value(value).map_err(|source| BackendError::Decode {
            endpoint: "fake".to_string(),
            source,
        })
    }

    /// In-memory source control: repositories with branch lists, commits and
    /// pull requests.
    struct FakeScm {
        branches: Mutex<HashMap<(String, String), Vec<String>>>,
        commits: Mutex<Vec<(String, String, String)>>,
        next_pr: Mutex<u32>,
    }

    impl FakeScm {
        fn new() -> Self {
            let mut branches = HashMap::new();
            for repo in ["svc-a", "svc-b", "svc-c"] {
                branches.insert(("TEAM".to_string(), repo.to_string()), vec!["develop".to_string()]);
            }
            Self {
                branches: Mutex::new(branches),
                commits: Mutex::new(Vec::new()),
                next_pr: Mutex::new(100),
            }
        }

        fn branches_of(&self, project: &str, repo: &str) -> Vec<String> {
            self.branches
                .lock()
                .unwrap()
                .get(&(project.to_string(), repo.to_string()))
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Backend for FakeScm {
        async fn validate_credentials(&self, auth_header: &str) -> Result<CredentialStatus, BackendError> {
            let status = if auth_header == session::basic_auth_header("alice", "s3cret") {
                "valid"
            } else {
                "invalid"
            };
            reply(json!({ "status": status }))
        }

        async fn check_auth_token(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn logout(&self) -> Result<(), BackendError> {
            Ok(())
        }

        async fn get_branches(&self, request: &GetBranchesRequest) -> Result<GetBranchesResponse, BackendError> {
            let data: Vec<Value> = request
                .repo_list
                .iter()
                .map(|r| {
                    let known = self
                        .branches
                        .lock()
                        .unwrap()
                        .contains_key(&(r.project_name.clone(), r.repo_slug.clone()));
                    if known {
                        let branches: Vec<Value> = self
                            .branches_of(&r.project_name, &r.repo_slug)
                            .into_iter()
                            .map(|b| json!({"displayId": b}))
                            .collect();
                        json!({"projectName": r.project_name, "repository": r.repo_slug,
                               "branches": branches, "status": "success"})
                    } else {
                        json!({"projectName": r.project_name, "repository": r.repo_slug,
                               "error": "Repository not found", "status": "error"})
                    }
                })
                .collect();
            reply(json!({ "branchesData": data }))
        }

        async fn create_branches(
            &self,
            request: &CreateBranchesRequest,
        ) -> Result<CreateBranchesResponse, BackendError> {
            let mut results = Vec::new();
            let mut branches = self.branches.lock().unwrap();
            for r in &request.repo_list {
                let list = branches
                    .entry((r.project_name.clone(), r.repo_slug.clone()))
                    .or_default();
                let (status, message) = if list.contains(&request.branch_name) {
                    ("error", "Branch already exists")
                } else {
                    list.push(request.branch_name.clone());
                    ("success", "Branch created")
                };
                results.push(json!({"repo": r.repo_slug, "projectName": r.project_name,
                                    "status": status, "message": message}));
            }
            reply(json!({ "branchResults": results }))
        }

        async fn create_pull_requests(
            &self,
            request: &CreatePullRequestsRequest,
        ) -> Result<CreatePullRequestsResponse, BackendError> {
            let mut results = Vec::new();
            for info in &request.pr_info_list {
                for r in &info.repo_info_list {
                    let mut next = self.next_pr.lock().unwrap();
                    *next += 1;
                    let href = format!("https://scm.example/{}/{}/pull/{}", r.project_name, r.repo_slug, next);
                    results.push(json!({
                        "repo": r.repo_slug, "projectName": r.project_name, "status": "success",
                        "message": "Pull request created",
                        "result": {"id": *next, "links": {"self": [{"href": href}]}}
                    }));
                }
            }
            reply(json!({ "createPullRequestResults": results }))
        }

        async fn update_dependency_version(
            &self,
            request: &UpdateDependencyRequest,
        ) -> Result<UpdateDependencyResponse, BackendError> {
            let results: Vec<Value> = request
                .repo_list
                .iter()
                .map(|m| {
                    json!({
                        "projectName": m.project_name, "repo": m.repo_slug, "module": m.module_name,
                        "status": "success", "message": "Updated",
                        "pomContent": ["<project>", format!("  <version>{}</version>", request.version), "</project>"]
                    })
                })
                .collect();
            reply(json!({ "updatedResults": results }))
        }

        async fn create_commit(&self, request: &CreateCommitRequest) -> Result<CreateCommitResponse, BackendError> {
            let mut results = Vec::new();
            for info in &request.commit_info_list {
                self.commits.lock().unwrap().push((
                    info.repository_info.repo_slug.clone(),
                    request.branch.clone(),
                    info.content.join(""),
                ));
                results.push(json!({
                    "projectName": info.repository_info.project_name,
                    "repo": info.repository_info.repo_slug,
                    "module": info.repository_info.module_name,
                    "status": "success"
                }));
            }
            reply(json!({ "commitResults": results }))
        }

        async fn get_repositories(
            &self,
            request: &GetRepositoriesRequest,
        ) -> Result<GetRepositoriesResponse, BackendError> {
            let names: Vec<String> = self
                .branches
                .lock()
                .unwrap()
                .keys()
                .filter(|(p, _)| *p == request.project_name)
                .map(|(_, r)| r.clone())
                .collect();
            reply(json!({ "applications": names }))
        }

        async fn get_pull_request_builds(
            &self,
            request: &PullRequestBuildsRequest,
        ) -> Result<PullRequestBuildsResponse, BackendError> {
            let builds: Vec<Value> = request
                .request_items
                .iter()
                .map(|item| {
                    json!({
                        "repoSlug": item.repository.repo_slug,
                        "projectName": item.repository.project_name,
                        "buildData": {"abc123": {"successful": 2, "inProgress": 1}}
                    })
                })
                .collect();
            reply(json!({ "pullRequestBuilds": builds }))
        }

        async fn get_supported_dependencies(&self) -> Result<Vec<String>, BackendError> {
            Ok(vec!["log4j".to_string(), "guava".to_string()])
        }

        async fn get_dependent_apps_and_versions(
            &self,
            dependency: &str,
        ) -> Result<DependentAppsResponse, BackendError> {
            match dependency {
                "log4j" => reply(json!({
                    "versions": ["2.17.0", {"name": "2.18.0"}],
                    "applications": [
                        {"project": "TEAM", "application": "svc-a", "moduleName": ""},
                        {"project": "TEAM", "application": "svc-b", "moduleName": "core"},
                        {"project": "TEAM", "application": "svc-gone"}
                    ]
                })),
                _ => reply(json!({
                    "versions": [{"version": "33.0"}],
                    "applications": [{"project": "TEAM", "application": "svc-c"}]
                })),
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    impl Recorder {
        fn errors(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.level == Level::Error)
                .map(|n| n.message.clone())
                .collect()
        }
    }

    fn context(dir: &tempfile::TempDir, scm: Arc<FakeScm>, recorder: Arc<Recorder>) -> Context {
        let store = Store::open(Arc::new(FileStorage::new(dir.path().to_path_buf())));
        Context::new(Arc::new(store), scm, recorder, Arc::new(NoopLoader))
    }

    #[tokio::test]
    async fn test_execute_all_upgrades_every_usable_repository() {
        let dir = tempfile::tempdir().unwrap();
        let scm = Arc::new(FakeScm::new());
        let recorder = Arc::new(Recorder::default());
        let ctx = context(&dir, scm.clone(), recorder.clone());

        assert!(session::login(&ctx, "alice", "s3cret").await);
        assert!(pipeline::sync_catalog(&ctx).await);
        pipeline::toggle_dependency(&ctx, "log4j");
        let added = pipeline::add_checked_pipelines(&ctx).await;
        assert_eq!(added.len(), 1);
        let id = added[0].clone();

        let catalog = ctx.store.dependencies();
        let log4j = catalog.supported_dependencies.iter().find(|d| d.name == "log4j").unwrap();
        assert_eq!(log4j.status, DependencyStatus::Added);

        let repos = ctx.store.repositories_for(&id);
        assert_eq!(repos.len(), 3);
        let gone = repos.iter().find(|r| r.repo_name == "svc-gone").unwrap();
        assert!(!gone.is_usable());

        pipeline::select_version(&ctx.store, &id, "2.18.0").unwrap();
        pipeline::set_ticket(&ctx.store, &id, "OPS-9").unwrap();
        pipeline::set_execute_all(&ctx.store, &id, true).unwrap();

        let runner = ExecuteAll::new(ctx.clone());
        let reports = runner.run(&id).await.unwrap();
        assert_eq!(runner.state(), ExecutionState::Done);
        let order: Vec<Phase> = reports.iter().map(|(p, _)| *p).collect();
        assert_eq!(order, Phase::ALL.to_vec());
        for (_, report) in &reports {
            assert!(report.is_completed(), "{}", report);
        }

        assert!(scm.branches_of("TEAM", "svc-a").contains(&"feature/OPS-9".to_string()));
        let commits = scm.commits.lock().unwrap().clone();
        assert_eq!(commits.len(), 2);
        assert!(commits.iter().all(|(_, branch, content)| {
            branch == "feature/OPS-9" && content.contains("<version>2.18.0</version>")
        }));

        for file in ctx.store.pom_files_for(&id) {
            assert_eq!(file.commit_status, CommitStatus::Committed);
        }
        for repo in ctx.store.repositories_for(&id).iter().filter(|r| r.is_usable()) {
            assert!(repo.pr_link.starts_with("https://scm.example/TEAM/"));
            assert!(repo.branches.iter().any(|b| b.display_id == "feature/OPS-9"));
        }

        assert!(phases::fetch_builds(&ctx, &ctx.store.pipeline(&id).unwrap()).await.is_completed());
        let svc_a = ctx
            .store
            .repositories_for(&id)
            .into_iter()
            .find(|r| r.repo_name == "svc-a")
            .unwrap();
        assert_eq!(svc_a.build.unwrap().successful, 2);
        assert!(recorder.errors().is_empty(), "{:?}", recorder.errors());

        // Everything survives a reopen of the same state directory.
        let reopened = Store::open(Arc::new(FileStorage::new(dir.path().to_path_buf())));
        assert_eq!(reopened.pom_files_for(&id).len(), 2);
        assert!(reopened.pipeline(&id).unwrap().execute_all);
    }

    #[tokio::test]
    async fn test_individual_mode_locks_and_refresh_unlocks() {
        let dir = tempfile::tempdir().unwrap();
        let scm = Arc::new(FakeScm::new());
        let ctx = context(&dir, scm, Arc::new(Recorder::default()));

        let id = pipeline::add_pipeline(&ctx, "guava").await.unwrap();
        pipeline::set_ticket(&ctx.store, &id, "OPS-3").unwrap();

        let report = pipeline::run_individual(&ctx, &id, Phase::CreateBranches).await.unwrap();
        assert_eq!(report, PhaseReport::Completed { succeeded: 1, failed: 0 });
        assert!(pipeline::set_execute_all(&ctx.store, &id, true).is_err());

        let again = pipeline::run_individual(&ctx, &id, Phase::CreateBranches).await.unwrap();
        assert_eq!(again, PhaseReport::Completed { succeeded: 0, failed: 1 });

        let fresh = pipeline::refresh_pipeline(&ctx, &id).await.unwrap();
        assert_ne!(fresh, id);
        assert!(ctx.store.pipeline(&id).is_none());
        pipeline::set_execute_all(&ctx.store, &fresh, true).unwrap();
    }

    #[tokio::test]
    async fn test_workspace_branches_and_pull_requests() {
        let dir = tempfile::tempdir().unwrap();
        let scm = Arc::new(FakeScm::new());
        let ctx = context(&dir, scm.clone(), Arc::new(Recorder::default()));

        assert!(workspace::add_project(&ctx, "TEAM").await);
        assert!(workspace::toggle_repository(&ctx, "TEAM", "svc-b"));
        workspace::edit_workspace(&ctx, WorkspaceEdit::NewBranch("release/1.0".into()));
        workspace::edit_workspace(&ctx, WorkspaceEdit::PrFromBranch("release/1.0".into()));
        workspace::edit_workspace(&ctx, WorkspaceEdit::PrTitle("Release 1.0".into()));

        assert!(workspace::create_branches(&ctx).await.is_completed());
        assert!(workspace::create_pull_requests(&ctx).await.is_completed());
        assert!(scm.branches_of("TEAM", "svc-b").contains(&"release/1.0".to_string()));
        assert!(!scm.branches_of("TEAM", "svc-a").contains(&"release/1.0".to_string()));

        assert!(workspace::fetch_builds(&ctx, "TEAM").await.is_completed());
        let ws = ctx.store.branch_actions();
        let project = ws.projects.iter().find(|p| p.name == "TEAM").unwrap();
        let svc_b = &project.selected_repositories[0];
        assert_eq!(svc_b.name, "svc-b");
        assert!(svc_b.pr_id.is_some());
        assert_eq!(svc_b.build.unwrap().in_progress, 1);

        workspace::remove_project(&ctx, "TEAM");
        assert!(ctx.store.branch_actions().supported_projects.contains(&"TEAM".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let ctx = context(&dir, Arc::new(FakeScm::new()), recorder.clone());

        assert!(!session::login(&ctx, "alice", "wrong").await);
        assert_eq!(recorder.errors().len(), 1);
    }
}
