use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keys::{self, POM_FILE_NAME};

/// Catalog status of a supported dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyStatus {
    #[serde(rename = "checked")]
    Checked,
    #[serde(rename = "can-be-added")]
    CanBeAdded,
    /// Already added as a pipeline.
    #[serde(rename = "none")]
    Added,
}

impl DependencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checked => "checked",
            Self::CanBeAdded => "can-be-added",
            Self::Added => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedDependency {
    pub name: String,
    pub status: DependencyStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOption {
    pub name: String,
}

/// Execution-mode latch of a pipeline.
///
/// Persisted as the boolean `individualModeExecuted`. Once `Locked`, the
/// pipeline's `execute_all` flag never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ModeLock {
    #[default]
    Unlocked,
    Locked,
}

impl ModeLock {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl From<bool> for ModeLock {
    fn from(executed: bool) -> Self {
        if executed { Self::Locked } else { Self::Unlocked }
    }
}

impl From<ModeLock> for bool {
    fn from(lock: ModeLock) -> Self {
        lock.is_locked()
    }
}

/// Collapsible sections of a pipeline view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    DependentApplications,
    CreateBranches,
    UpdateFiles,
    CreatePullRequests,
    PullRequestLinks,
}

/// A single field edit on a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEdit {
    FromBranch(String),
    NewBranch(String),
    PrFromBranch(String),
    ToBranch(String),
    UpdateFileBranch(String),
    CommitMessage(String),
    PullRequestTitle(String),
    PullRequestDescription(String),
    Open(bool),
    SectionOpen(Section, bool),
}

/// A dependency the user is actively upgrading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedDependency {
    pub id: String,
    pub name: String,
    pub selected_version: String,
    pub versions: Vec<VersionOption>,
    pub from_branch: String,
    pub new_branch: String,
    pub pr_from_branch: String,
    pub to_branch: String,
    pub update_file_branch: String,
    pub execute_all: bool,
    pub is_open: bool,
    pub is_dependent_applications_open: bool,
    pub is_create_branches_open: bool,
    pub is_update_files_open: bool,
    pub is_create_pull_requests_open: bool,
    pub is_pull_request_links_open: bool,
    pub commit_message: String,
    pub pull_request_title: String,
    pub pull_request_description: String,
    #[serde(rename = "individualModeExecuted")]
    pub mode_lock: ModeLock,
}

impl AddedDependency {
    /// New pipeline with a fresh random id. The first version is selected.
    pub fn new(name: &str, versions: Vec<VersionOption>) -> Self {
        let selected_version = versions.first().map(|v| v.name.clone()).unwrap_or_default();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            commit_message: format!("Update {} to {}", name, selected_version),
            pull_request_title: format!("Update {} to {}", name, selected_version),
            pull_request_description: format!(
                "This pull request updates the dependency **{}** to version **{}**",
                name, selected_version
            ),
            selected_version,
            versions,
            from_branch: "develop".to_string(),
            new_branch: String::new(),
            pr_from_branch: String::new(),
            to_branch: "develop".to_string(),
            update_file_branch: String::new(),
            execute_all: false,
            is_open: false,
            is_dependent_applications_open: false,
            is_create_branches_open: false,
            is_update_files_open: false,
            is_create_pull_requests_open: false,
            is_pull_request_links_open: false,
            mode_lock: ModeLock::Unlocked,
        }
    }

    pub fn apply(&mut self, edit: PipelineEdit) {
        match edit {
            PipelineEdit::FromBranch(v) => self.from_branch = v,
            PipelineEdit::NewBranch(v) => self.new_branch = v,
            PipelineEdit::PrFromBranch(v) => self.pr_from_branch = v,
            PipelineEdit::ToBranch(v) => self.to_branch = v,
            PipelineEdit::UpdateFileBranch(v) => self.update_file_branch = v,
            PipelineEdit::CommitMessage(v) => self.commit_message = v,
            PipelineEdit::PullRequestTitle(v) => self.pull_request_title = v,
            PipelineEdit::PullRequestDescription(v) => self.pull_request_description = v,
            PipelineEdit::Open(open) => self.is_open = open,
            PipelineEdit::SectionOpen(section, open) => {
                let flag = match section {
                    Section::DependentApplications => &mut self.is_dependent_applications_open,
                    Section::CreateBranches => &mut self.is_create_branches_open,
                    Section::UpdateFiles => &mut self.is_update_files_open,
                    Section::CreatePullRequests => &mut self.is_create_pull_requests_open,
                    Section::PullRequestLinks => &mut self.is_pull_request_links_open,
                };
                *flag = open;
            }
        }
    }

    /// Select a version and regenerate the commit message and PR texts for it.
    pub fn select_version(&mut self, version: &str) {
        self.selected_version = version.to_string();
        self.commit_message = format!("Upgrade {} to {}", self.name, version);
        self.pull_request_title = format!("Upgrade {} to {}", self.name, version);
        self.pull_request_description = format!(
            "This PR upgrades the dependency **{}** to version **{}**.",
            self.name, version
        );
    }

    /// Derive `feature/<ticket>` into every branch field a ticket drives.
    pub fn set_ticket(&mut self, ticket: &str) {
        let branch = format!("feature/{}", ticket.trim());
        self.new_branch = branch.clone();
        self.pr_from_branch = branch.clone();
        self.update_file_branch = branch;
    }

    /// Commit message, falling back to the default when left empty.
    pub fn effective_commit_message(&self) -> String {
        if self.commit_message.trim().is_empty() {
            format!("Update {} to {}", self.name, self.selected_version)
        } else {
            self.commit_message.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependenciesState {
    pub supported_dependencies: Vec<SupportedDependency>,
    pub added_dependencies: Vec<AddedDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub display_id: String,
}

/// Build counts of a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSummary {
    pub cancelled: u32,
    pub successful: u32,
    pub in_progress: u32,
    pub failed: u32,
    pub unknown: u32,
}

/// One buildable module of a repository that declares the dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentApplication {
    pub id: String,
    pub project_name: String,
    pub repo_name: String,
    pub module_name: String,
    #[serde(rename = "updateDpendencyVersion")]
    pub update_dependency_version: bool,
    #[serde(
        rename = "updateDpendencyVersionstatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_status: Option<String>,
    #[serde(
        rename = "updateDpendencyVersionmessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_message: Option<String>,
    pub pom_file_id: String,
}

impl DependentApplication {
    pub fn new(project: &str, repo: &str, module: &str, dependency: &str) -> Self {
        Self {
            id: keys::application_key(project, repo, module, dependency),
            project_name: project.to_string(),
            repo_name: repo.to_string(),
            module_name: module.to_string(),
            update_dependency_version: true,
            update_status: None,
            update_message: None,
            pom_file_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentRepository {
    pub id: String,
    pub project_name: String,
    pub repo_name: String,
    pub dependency_name: String,
    pub dependency_id: String,
    /// Set when the repository is unusable for this dependency.
    #[serde(default)]
    pub error: Option<String>,
    pub branches: Vec<Branch>,
    pub create_branches_status: String,
    pub create_branches_message: String,
    pub create_pull_requests_status: String,
    pub create_pull_requests_message: String,
    pub create_branches: bool,
    pub create_pull_requests: bool,
    pub pr_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_id: Option<String>,
    pub dependent_applications: Vec<DependentApplication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSummary>,
}

impl DependentRepository {
    pub fn new(project: &str, repo: &str, dependency_name: &str, dependency_id: &str) -> Self {
        Self {
            id: keys::repository_key(project, repo, dependency_name),
            project_name: project.to_string(),
            repo_name: repo.to_string(),
            dependency_name: dependency_name.to_string(),
            dependency_id: dependency_id.to_string(),
            error: None,
            branches: Vec::new(),
            create_branches_status: String::new(),
            create_branches_message: String::new(),
            create_pull_requests_status: String::new(),
            create_pull_requests_message: String::new(),
            create_branches: true,
            create_pull_requests: true,
            pr_link: String::new(),
            pr_id: None,
            dependent_applications: Vec::new(),
            build: None,
        }
    }

    /// Repositories with a branch lookup error are skipped by every phase.
    pub fn is_usable(&self) -> bool {
        self.error.is_none()
    }
}

/// Partial update of a `DependentRepository`. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPatch {
    pub branches: Option<Vec<Branch>>,
    pub create_branches_status: Option<String>,
    pub create_branches_message: Option<String>,
    pub create_pull_requests_status: Option<String>,
    pub create_pull_requests_message: Option<String>,
    pub create_branches: Option<bool>,
    pub create_pull_requests: Option<bool>,
    pub pr_link: Option<String>,
    pub pr_id: Option<String>,
    pub build: Option<BuildSummary>,
}

impl RepositoryPatch {
    pub fn apply(self, repo: &mut DependentRepository) {
        if let Some(v) = self.branches {
            repo.branches = v;
        }
        if let Some(v) = self.create_branches_status {
            repo.create_branches_status = v;
        }
        if let Some(v) = self.create_branches_message {
            repo.create_branches_message = v;
        }
        if let Some(v) = self.create_pull_requests_status {
            repo.create_pull_requests_status = v;
        }
        if let Some(v) = self.create_pull_requests_message {
            repo.create_pull_requests_message = v;
        }
        if let Some(v) = self.create_branches {
            repo.create_branches = v;
        }
        if let Some(v) = self.create_pull_requests {
            repo.create_pull_requests = v;
        }
        if let Some(v) = self.pr_link {
            repo.pr_link = v;
        }
        if let Some(v) = self.pr_id {
            repo.pr_id = Some(v);
        }
        if let Some(v) = self.build {
            repo.build = Some(v);
        }
    }
}

/// Per-repository selection flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryFlag {
    CreateBranches,
    CreatePullRequests,
}

impl RepositoryFlag {
    pub fn patch(self, on: bool) -> RepositoryPatch {
        match self {
            Self::CreateBranches => RepositoryPatch {
                create_branches: Some(on),
                ..Default::default()
            },
            Self::CreatePullRequests => RepositoryPatch {
                create_pull_requests: Some(on),
                ..Default::default()
            },
        }
    }
}

/// Partial update of a `DependentApplication`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub update_dependency_version: Option<bool>,
    pub update_status: Option<String>,
    pub update_message: Option<String>,
    pub pom_file_id: Option<String>,
}

impl ApplicationPatch {
    pub fn apply(self, app: &mut DependentApplication) {
        if let Some(v) = self.update_dependency_version {
            app.update_dependency_version = v;
        }
        if let Some(v) = self.update_status {
            app.update_status = Some(v);
        }
        if let Some(v) = self.update_message {
            app.update_message = Some(v);
        }
        if let Some(v) = self.pom_file_id {
            app.pom_file_id = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitStatus {
    #[default]
    #[serde(rename = "")]
    Pending,
    #[serde(rename = "committed")]
    Committed,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Committed => write!(f, "committed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A rewritten build descriptor awaiting commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomFile {
    pub id: String,
    pub dependency_id: String,
    pub dependency_name: String,
    /// Owning `DependentApplication` id (relation only).
    pub app_id: String,
    pub file_name: String,
    pub project_name: String,
    pub repo_name: String,
    pub module_name: String,
    pub content: String,
    pub commit_status: CommitStatus,
    pub commit_status_message: String,
    pub selected_for_commit: bool,
}

impl PomFile {
    pub fn new(
        pipeline: &AddedDependency,
        project: &str,
        repo: &str,
        module: &str,
        file_name: Option<&str>,
        content: String,
    ) -> Self {
        Self {
            id: keys::pom_file_key(project, repo, module, &pipeline.name, POM_FILE_NAME),
            dependency_id: pipeline.id.clone(),
            dependency_name: pipeline.name.clone(),
            app_id: keys::application_key(project, repo, module, &pipeline.name),
            file_name: file_name.unwrap_or(POM_FILE_NAME).to_string(),
            project_name: project.to_string(),
            repo_name: repo.to_string(),
            module_name: module.to_string(),
            content,
            commit_status: CommitStatus::Pending,
            commit_status_message: String::new(),
            selected_for_commit: true,
        }
    }
}

/// Partial update of a `PomFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomFilePatch {
    pub content: Option<String>,
    pub commit_status: Option<CommitStatus>,
    pub commit_status_message: Option<String>,
    pub selected_for_commit: Option<bool>,
}

impl PomFilePatch {
    pub fn apply(self, file: &mut PomFile) {
        if let Some(v) = self.content {
            file.content = v;
        }
        if let Some(v) = self.commit_status {
            file.commit_status = v;
        }
        if let Some(v) = self.commit_status_message {
            file.commit_status_message = v;
        }
        if let Some(v) = self.selected_for_commit {
            file.selected_for_commit = v;
        }
    }
}

// Branch-actions workspace models

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRepository {
    pub name: String,
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_branches_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_branches_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_pull_request_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_pull_request_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSummary>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl WorkspaceRepository {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Partial update of a `WorkspaceRepository`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceRepositoryPatch {
    pub create_branches_status: Option<String>,
    pub create_branches_message: Option<String>,
    pub create_pull_request_status: Option<String>,
    pub create_pull_request_message: Option<String>,
    pub pull_request_link: Option<String>,
    pub pr_id: Option<String>,
    pub build: Option<BuildSummary>,
}

impl WorkspaceRepositoryPatch {
    pub fn apply(self, repo: &mut WorkspaceRepository) {
        if self.create_branches_status.is_some() {
            repo.create_branches_status = self.create_branches_status;
        }
        if self.create_branches_message.is_some() {
            repo.create_branches_message = self.create_branches_message;
        }
        if self.create_pull_request_status.is_some() {
            repo.create_pull_request_status = self.create_pull_request_status;
        }
        if self.create_pull_request_message.is_some() {
            repo.create_pull_request_message = self.create_pull_request_message;
        }
        if self.pull_request_link.is_some() {
            repo.pull_request_link = self.pull_request_link;
        }
        if self.pr_id.is_some() {
            repo.pr_id = self.pr_id;
        }
        if self.build.is_some() {
            repo.build = self.build;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub repositories: Vec<WorkspaceRepository>,
    pub selected_repositories: Vec<WorkspaceRepository>,
}

/// Text fields of the branch-actions workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEdit {
    FromBranch(String),
    NewBranch(String),
    PrFromBranch(String),
    PrToBranch(String),
    PrTitle(String),
    PrDescription(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchActionsData {
    pub supported_projects: Vec<String>,
    pub from_branch: String,
    pub new_branch: String,
    pub pr_from_branch: String,
    pub pr_to_branch: String,
    pub pr_title: String,
    pub pr_description: String,
    pub projects: Vec<Project>,
}

impl Default for BranchActionsData {
    fn default() -> Self {
        Self {
            supported_projects: vec!["E-OP".to_string(), "E-EOR".to_string()],
            from_branch: "develop".to_string(),
            new_branch: "feature/".to_string(),
            pr_from_branch: "feature/".to_string(),
            pr_to_branch: "develop".to_string(),
            pr_title: String::new(),
            pr_description: String::new(),
            projects: Vec::new(),
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependent-applications" => Ok(Self::DependentApplications),
            "create-branches" => Ok(Self::CreateBranches),
            "update-files" => Ok(Self::UpdateFiles),
            "create-pull-requests" => Ok(Self::CreatePullRequests),
            "pull-request-links" => Ok(Self::PullRequestLinks),
            _ => Err(format!("Invalid section: {}", s)),
        }
    }
}
