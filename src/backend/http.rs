//! `Backend` over HTTP: JSON POSTs (GETs for catalog lookups) under a base URL.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Backend;
use super::types::*;
use crate::config::Endpoints;
use crate::errors::BackendError;

/// Percent-encode `value` so it fills exactly one path segment.
fn encode_path_segment(value: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost") else {
        return value.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(value);
    }
    url.path().trim_start_matches('/').to_string()
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    authorization: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: &str, endpoints: Endpoints) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("depflow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| BackendError::Request {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
            authorization: RwLock::new(None),
        })
    }

    /// Attach an `Authorization` header to every subsequent request.
    pub fn set_authorization(&self, header: Option<String>) {
        *self
            .authorization
            .write()
            .unwrap_or_else(PoisonError::into_inner) = header;
    }

    pub fn authorization(&self) -> Option<String> {
        self.authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.authorization() {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        }
    }

    /// Send and return the raw body of a 2xx response.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<String, BackendError> {
        tracing::debug!(endpoint, "backend request");
        let request_err = |source| BackendError::Request {
            endpoint: endpoint.to_string(),
            source,
        };
        let response = request.send().await.map_err(request_err)?;
        let status = response.status();
        let body = response.text().await.map_err(request_err)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn decode<R: DeserializeOwned>(endpoint: &str, body: &str) -> Result<R, BackendError> {
        serde_json::from_str(body).map_err(|source| BackendError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(self.url(endpoint)).json(body));
        let raw = self.send(endpoint, request).await?;
        Self::decode(endpoint, &raw)
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, BackendError> {
        let request = self.authorize(self.client.get(self.url(endpoint)));
        let raw = self.send(endpoint, request).await?;
        Self::decode(endpoint, &raw)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn validate_credentials(&self, auth_header: &str) -> Result<CredentialStatus, BackendError> {
        let endpoint = &self.endpoints.validate_credentials;
        let request = self
            .client
            .post(self.url(endpoint))
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .json(&serde_json::json!({}));
        let raw = self.send(endpoint, request).await?;
        let status: CredentialStatus = Self::decode(endpoint, &raw)?;
        if status.is_valid() {
            self.set_authorization(Some(auth_header.to_string()));
        }
        Ok(status)
    }

    async fn check_auth_token(&self) -> Result<(), BackendError> {
        let endpoint = &self.endpoints.check_auth_token;
        let request = self.authorize(self.client.post(self.url(endpoint)));
        self.send(endpoint, request).await.map(|_| ())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let endpoint = &self.endpoints.logout;
        let request = self.authorize(self.client.post(self.url(endpoint)));
        let result = self.send(endpoint, request).await.map(|_| ());
        self.set_authorization(None);
        result
    }

    async fn get_branches(&self, request: &GetBranchesRequest) -> Result<GetBranchesResponse, BackendError> {
        self.post(&self.endpoints.get_branches, request).await
    }

    async fn create_branches(
        &self,
        request: &CreateBranchesRequest,
    ) -> Result<CreateBranchesResponse, BackendError> {
        self.post(&self.endpoints.create_branches, request).await
    }

    async fn create_pull_requests(
        &self,
        request: &CreatePullRequestsRequest,
    ) -> Result<CreatePullRequestsResponse, BackendError> {
        self.post(&self.endpoints.create_pull_requests, request).await
    }

    async fn update_dependency_version(
        &self,
        request: &UpdateDependencyRequest,
    ) -> Result<UpdateDependencyResponse, BackendError> {
        self.post(&self.endpoints.update_dependency, request).await
    }

    async fn create_commit(&self, request: &CreateCommitRequest) -> Result<CreateCommitResponse, BackendError> {
        self.post(&self.endpoints.create_commit, request).await
    }

    async fn get_repositories(
        &self,
        request: &GetRepositoriesRequest,
    ) -> Result<GetRepositoriesResponse, BackendError> {
        self.post(&self.endpoints.get_repositories, request).await
    }

    async fn get_pull_request_builds(
        &self,
        request: &PullRequestBuildsRequest,
    ) -> Result<PullRequestBuildsResponse, BackendError> {
        self.post(&self.endpoints.get_pull_request_builds, request).await
    }

    async fn get_supported_dependencies(&self) -> Result<Vec<String>, BackendError> {
        self.get(&self.endpoints.get_supported_dependencies).await
    }

    async fn get_dependent_apps_and_versions(
        &self,
        dependency: &str,
    ) -> Result<DependentAppsResponse, BackendError> {
        let endpoint = self
            .endpoints
            .dependent_apps_and_versions
            .replace("{depname}", &encode_path_segment(dependency));
        self.get(&endpoint).await
    }
}
