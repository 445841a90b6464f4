//! Request and response shapes of the source control backend (camelCase JSON).

use serde::{Deserialize, Serialize};

use crate::models::{Branch, BuildSummary};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

pub fn is_error_status(status: &str) -> bool {
    status == STATUS_ERROR
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    pub project_name: String,
    pub repo_slug: String,
}

impl RepoRef {
    pub fn new(project: &str, repo: &str) -> Self {
        Self {
            project_name: project.to_string(),
            repo_slug: repo.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRef {
    pub project_name: String,
    pub repo_slug: String,
    pub module_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub status: String,
}

impl CredentialStatus {
    pub fn is_valid(&self) -> bool {
        self.status == "valid"
    }
}

// ---- branches ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBranchesRequest {
    pub repo_list: Vec<RepoRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchesData {
    pub project_name: String,
    pub repository: String,
    #[serde(default)]
    pub branches: Option<Vec<Branch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl BranchesData {
    /// Branch list; errored entries may send `null`.
    pub fn branch_list(self) -> Vec<Branch> {
        self.branches.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBranchesResponse {
    #[serde(default)]
    pub branches_data: Vec<BranchesData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchesRequest {
    pub repo_list: Vec<RepoRef>,
    pub branch_name: String,
    pub start_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResult {
    pub repo: String,
    pub project_name: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchesResponse {
    #[serde(default)]
    pub branch_results: Vec<BranchResult>,
}

// ---- pull requests ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    pub repo_info_list: Vec<RepoRef>,
    pub from_branch: String,
    pub to_branch: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequestsRequest {
    pub pr_info_list: Vec<PullRequestInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLinks {
    #[serde(rename = "self", default)]
    pub self_links: Vec<Link>,
}

/// The created pull request as reported by the source control server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPullRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub links: Option<PullRequestLinks>,
}

impl CreatedPullRequest {
    /// Pull request id as a string; numeric ids are rendered in decimal.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn self_href(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .self_links
            .first()
            .map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestResult {
    pub repo: String,
    pub project_name: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<CreatedPullRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePullRequestsResponse {
    #[serde(default)]
    pub create_pull_request_results: Vec<PullRequestResult>,
}

// ---- dependency version updates ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDependencyRequest {
    pub repo_list: Vec<ModuleRef>,
    pub branch_name: String,
    pub dependency: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedResult {
    pub project_name: String,
    pub repo: String,
    #[serde(default)]
    pub module: Option<String>,
    pub status: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub pom_content: Option<Vec<String>>,
    #[serde(default)]
    pub eol: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl UpdatedResult {
    pub fn is_error(&self) -> bool {
        is_error_status(&self.status)
    }

    /// Module name, empty for the root module.
    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or_default()
    }

    /// Join the returned lines with the line ending the backend declared
    /// (`\r\n`), defaulting to `\n`.
    pub fn joined_content(&self) -> String {
        let eol = if self.eol.as_deref() == Some("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        self.pom_content
            .as_deref()
            .map(|lines| lines.join(eol))
            .unwrap_or_default()
    }

    /// Message to show for this item: the error on failure, otherwise the message.
    pub fn status_message(&self) -> String {
        let msg = if self.is_error() {
            &self.error
        } else {
            &self.message
        };
        msg.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDependencyResponse {
    #[serde(default)]
    pub updated_results: Vec<UpdatedResult>,
}

// ---- commits ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub repository_info: ModuleRef,
    pub file_name: String,
    pub content: Vec<String>,
    pub commit_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitRequest {
    pub commit_info_list: Vec<CommitInfo>,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub project_name: String,
    pub repo: String,
    #[serde(default)]
    pub module: Option<String>,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitResponse {
    #[serde(default)]
    pub commit_results: Vec<CommitResult>,
}

// ---- repositories of a project ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRepositoriesRequest {
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRepositoriesResponse {
    #[serde(default)]
    pub applications: Vec<String>,
}

// ---- pull request builds ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequestItem {
    pub repository: RepoRef,
    pub pr_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestBuildsRequest {
    pub request_items: Vec<BuildRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestBuild {
    pub repo_slug: String,
    pub project_name: String,
    /// Build counts keyed by commit hash, in server order.
    #[serde(default)]
    pub build_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl PullRequestBuild {
    /// Counts of the first commit hash the server listed.
    pub fn first_summary(&self) -> Option<BuildSummary> {
        let (_, counts) = self.build_data.as_ref()?.iter().next()?;
        serde_json::from_value(counts.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestBuildsResponse {
    #[serde(default)]
    pub pull_request_builds: Vec<PullRequestBuild>,
}

// ---- dependency catalog ----

/// A version entry; the backend sends `{name}`, `{version}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionEntry {
    Named { name: String },
    Versioned { version: String },
    Plain(String),
}

impl VersionEntry {
    pub fn into_name(self) -> String {
        match self {
            Self::Named { name } => name,
            Self::Versioned { version } => version,
            Self::Plain(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub project: String,
    pub application: String,
    #[serde(default)]
    pub module_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentAppsResponse {
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_entry_shapes() {
        let versions: Vec<VersionEntry> =
            serde_json::from_value(json!([{"name": "1.0"}, {"version": "2.0"}, "3.0"])).unwrap();
        let names: Vec<String> = versions.into_iter().map(VersionEntry::into_name).collect();
        assert_eq!(names, vec!["1.0", "2.0", "3.0"]);
    }

    #[test]
    fn test_joined_content_respects_eol() {
        let mut result: UpdatedResult = serde_json::from_value(json!({
            "projectName": "TEAM",
            "repo": "service-a",
            "module": "",
            "status": "success",
            "pomContent": ["<project>", "</project>"],
        }))
        .unwrap();
        assert_eq!(result.joined_content(), "<project>\n</project>");
        result.eol = Some("\r\n".into());
        assert_eq!(result.joined_content(), "<project>\r\n</project>");
    }

    #[test]
    fn test_null_fields_decode_as_empty() {
        let result: UpdatedResult = serde_json::from_value(json!({
            "projectName": "TEAM",
            "repo": "service-a",
            "module": null,
            "status": "error",
            "pomContent": null,
        }))
        .unwrap();
        assert_eq!(result.module_name(), "");
        assert_eq!(result.joined_content(), "");

        let data: BranchesData = serde_json::from_value(json!({
            "projectName": "TEAM",
            "repository": "service-b",
            "branches": null,
            "error": "Repository not found",
        }))
        .unwrap();
        assert!(data.branch_list().is_empty());

        let commit: CommitResult = serde_json::from_value(json!({
            "projectName": "TEAM",
            "repo": "service-a",
            "module": null,
            "status": "success",
        }))
        .unwrap();
        assert!(commit.module.is_none());
    }

    #[test]
    fn test_updated_result_status_message() {
        let result: UpdatedResult = serde_json::from_value(json!({
            "projectName": "TEAM",
            "repo": "service-a",
            "status": "error",
            "error": "pom.xml not found",
            "message": "ignored",
        }))
        .unwrap();
        assert!(result.is_error());
        assert_eq!(result.module_name(), "");
        assert_eq!(result.status_message(), "pom.xml not found");
    }

    #[test]
    fn test_created_pull_request_accessors() {
        let pr: CreatedPullRequest = serde_json::from_value(json!({
            "id": 42,
            "links": {"self": [{"href": "https://scm/pr/42"}]}
        }))
        .unwrap();
        assert_eq!(pr.id_string().as_deref(), Some("42"));
        assert_eq!(pr.self_href(), Some("https://scm/pr/42"));
    }

    #[test]
    fn test_first_build_summary_uses_server_order() {
        let build: PullRequestBuild = serde_json::from_value(json!({
            "repoSlug": "service-a",
            "projectName": "TEAM",
            "buildData": {
                "ffff": {"cancelled": 0, "successful": 2, "inProgress": 1, "failed": 0, "unknown": 0},
                "0000": {"cancelled": 9, "successful": 9, "inProgress": 9, "failed": 9, "unknown": 9}
            }
        }))
        .unwrap();
        let summary = build.first_summary().unwrap();
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.in_progress, 1);
    }

    #[test]
    fn test_missing_build_data_has_no_summary() {
        let build: PullRequestBuild = serde_json::from_value(json!({
            "repoSlug": "service-a",
            "projectName": "TEAM",
        }))
        .unwrap();
        assert!(build.first_summary().is_none());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let req = CreateBranchesRequest {
            repo_list: vec![RepoRef::new("TEAM", "service-a")],
            branch_name: "feature/x".into(),
            start_point: "develop".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "repoList": [{"projectName": "TEAM", "repoSlug": "service-a"}],
                "branchName": "feature/x",
                "startPoint": "develop",
            })
        );
    }
}
