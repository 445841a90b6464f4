//! Test doubles shared by the in-crate test modules.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::backend::Backend;
use crate::backend::types::*;
use crate::context::Context;
use crate::errors::BackendError;
use crate::models::*;
use crate::store::Store;
use crate::ui::{Level, Loader, Notification, Notifier};

#[derive(Clone)]
enum Scripted {
    Respond(Value),
    Fail(u16),
}

/// A `Backend` that answers from per-method queues and records every call.
#[derive(Default)]
pub struct ScriptedBackend {
    queued: Mutex<HashMap<&'static str, VecDeque<Scripted>>>,
    always: Mutex<HashMap<&'static str, Scripted>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `method`.
    pub fn respond(&self, method: &'static str, value: Value) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(Scripted::Respond(value));
        self
    }

    /// Queue one failure with the given HTTP status for `method`.
    pub fn fail(&self, method: &'static str, status: u16) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(Scripted::Fail(status));
        self
    }

    /// Answer every call to `method` with `value` once its queue is drained.
    pub fn always(&self, method: &'static str, value: Value) -> &Self {
        self.always
            .lock()
            .unwrap()
            .insert(method, Scripted::Respond(value));
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body)
            .collect()
    }

    fn answer<B: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &B,
    ) -> Result<R, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), serde_json::to_value(body).unwrap()));
        let next = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.always.lock().unwrap().get(method).cloned());
        match next {
            Some(Scripted::Respond(value)) => {
                serde_json::from_value(value).map_err(|source| BackendError::Decode {
                    endpoint: method.to_string(),
                    source,
                })
            }
            Some(Scripted::Fail(status)) => Err(BackendError::Status {
                endpoint: method.to_string(),
                status,
                body: "scripted failure".to_string(),
            }),
            None => Err(BackendError::Status {
                endpoint: method.to_string(),
                status: 500,
                body: "no scripted response".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn validate_credentials(&self, auth_header: &str) -> Result<CredentialStatus, BackendError> {
        self.answer("validate_credentials", &json!({ "authorization": auth_header }))
    }

    async fn check_auth_token(&self) -> Result<(), BackendError> {
        self.answer::<_, Value>("check_auth_token", &json!({}))
            .map(|_| ())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.answer::<_, Value>("logout", &json!({})).map(|_| ())
    }

    async fn get_branches(&self, request: &GetBranchesRequest) -> Result<GetBranchesResponse, BackendError> {
        self.answer("get_branches", request)
    }

    async fn create_branches(
        &self,
        request: &CreateBranchesRequest,
    ) -> Result<CreateBranchesResponse, BackendError> {
        self.answer("create_branches", request)
    }

    async fn create_pull_requests(
        &self,
        request: &CreatePullRequestsRequest,
    ) -> Result<CreatePullRequestsResponse, BackendError> {
        self.answer("create_pull_requests", request)
    }

    async fn update_dependency_version(
        &self,
        request: &UpdateDependencyRequest,
    ) -> Result<UpdateDependencyResponse, BackendError> {
        self.answer("update_dependency_version", request)
    }

    async fn create_commit(&self, request: &CreateCommitRequest) -> Result<CreateCommitResponse, BackendError> {
        self.answer("create_commit", request)
    }

    async fn get_repositories(
        &self,
        request: &GetRepositoriesRequest,
    ) -> Result<GetRepositoriesResponse, BackendError> {
        self.answer("get_repositories", request)
    }

    async fn get_pull_request_builds(
        &self,
        request: &PullRequestBuildsRequest,
    ) -> Result<PullRequestBuildsResponse, BackendError> {
        self.answer("get_pull_request_builds", request)
    }

    async fn get_supported_dependencies(&self) -> Result<Vec<String>, BackendError> {
        self.answer("get_supported_dependencies", &json!({}))
    }

    async fn get_dependent_apps_and_versions(
        &self,
        dependency: &str,
    ) -> Result<DependentAppsResponse, BackendError> {
        self.answer(
            "get_dependent_apps_and_versions",
            &json!({ "dependency": dependency }),
        )
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Counts show/hide calls so tests can assert they pair up.
#[derive(Default)]
pub struct CountingLoader {
    shows: AtomicUsize,
    hides: AtomicUsize,
}

impl CountingLoader {
    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn balanced(&self) -> bool {
        self.shows.load(Ordering::SeqCst) == self.hides.load(Ordering::SeqCst)
    }
}

impl Loader for CountingLoader {
    fn show(&self) {
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.hides.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub ctx: Context,
    pub backend: Arc<ScriptedBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub loader: Arc<CountingLoader>,
}

pub fn harness() -> Harness {
    let backend = Arc::new(ScriptedBackend::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let loader = Arc::new(CountingLoader::default());
    let ctx = Context::new(
        Arc::new(Store::in_memory()),
        backend.clone(),
        notifier.clone(),
        loader.clone(),
    );
    Harness {
        ctx,
        backend,
        notifier,
        loader,
    }
}

/// Seed a `log4j` pipeline on branch `feature/JIRA-1` with two repositories
/// in project `TEAM`: `service-a` (root module) and `service-b` (module `core`).
pub fn seed_log4j(store: &Store) -> AddedDependency {
    let mut pipeline = AddedDependency::new(
        "log4j",
        vec![VersionOption {
            name: "2.17.0".to_string(),
        }],
    );
    pipeline.set_ticket("JIRA-1");

    let mut repos = Vec::new();
    for (repo_name, module) in [("service-a", ""), ("service-b", "core")] {
        let mut repo = DependentRepository::new("TEAM", repo_name, "log4j", &pipeline.id);
        repo.dependent_applications
            .push(DependentApplication::new("TEAM", repo_name, module, "log4j"));
        repo.branches = vec![Branch {
            display_id: "develop".to_string(),
        }];
        repos.push(repo);
    }
    store.insert_pipeline(pipeline.clone(), repos);
    pipeline
}

/// A stored pom file for `repo`/`module` of `pipeline`.
pub fn seed_pom_file(store: &Store, pipeline: &AddedDependency, repo: &str, module: &str) -> PomFile {
    let file = PomFile::new(pipeline, "TEAM", repo, module, None, "<project/>".to_string());
    store.upsert_pom_file(file.clone());
    file
}
