//! The source control backend collaborator.
//!
//! Real implementation: `HttpBackend`. Tests script the `Backend` trait directly.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::errors::BackendError;
pub use http::HttpBackend;
use types::*;

/// Capabilities the orchestration core consumes from the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn validate_credentials(&self, auth_header: &str) -> Result<CredentialStatus, BackendError>;

    /// Session probe: `Ok` while the session is alive.
    async fn check_auth_token(&self) -> Result<(), BackendError>;

    async fn logout(&self) -> Result<(), BackendError>;

    async fn get_branches(&self, request: &GetBranchesRequest) -> Result<GetBranchesResponse, BackendError>;

    async fn create_branches(
        &self,
        request: &CreateBranchesRequest,
    ) -> Result<CreateBranchesResponse, BackendError>;

    async fn create_pull_requests(
        &self,
        request: &CreatePullRequestsRequest,
    ) -> Result<CreatePullRequestsResponse, BackendError>;

    async fn update_dependency_version(
        &self,
        request: &UpdateDependencyRequest,
    ) -> Result<UpdateDependencyResponse, BackendError>;

    async fn create_commit(&self, request: &CreateCommitRequest) -> Result<CreateCommitResponse, BackendError>;

    async fn get_repositories(
        &self,
        request: &GetRepositoriesRequest,
    ) -> Result<GetRepositoriesResponse, BackendError>;

    async fn get_pull_request_builds(
        &self,
        request: &PullRequestBuildsRequest,
    ) -> Result<PullRequestBuildsResponse, BackendError>;

    async fn get_supported_dependencies(&self) -> Result<Vec<String>, BackendError>;

    async fn get_dependent_apps_and_versions(
        &self,
        dependency: &str,
    ) -> Result<DependentAppsResponse, BackendError>;
}
