//! Phase orchestrators.
//!
//! Each phase filters eligible records, sends one batched backend request,
//! merges the per-item results back by recomputed key and emits one summary
//! notification. Request failures are reported, never propagated.

pub mod builds;
pub mod commit;
pub mod create_branches;
pub mod pull_requests;
pub mod update_files;

use std::fmt;
use std::str::FromStr;

use crate::context::Context;
use crate::errors::BackendError;

pub use builds::{fetch_builds, watch_builds};
pub use commit::commit;
pub use create_branches::create_branches;
pub use pull_requests::create_pull_requests;
pub use update_files::update_files;

/// The four phases of a dependency pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CreateBranches,
    UpdateFiles,
    Commit,
    CreatePullRequests,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::CreateBranches,
        Phase::UpdateFiles,
        Phase::Commit,
        Phase::CreatePullRequests,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::CreateBranches => write!(f, "create-branches"),
            Phase::UpdateFiles => write!(f, "update-files"),
            Phase::Commit => write!(f, "commit"),
            Phase::CreatePullRequests => write!(f, "create-pull-requests"),
        }
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create-branches" | "branches" => Ok(Phase::CreateBranches),
            "update-files" | "update" => Ok(Phase::UpdateFiles),
            "commit" => Ok(Phase::Commit),
            "create-pull-requests" | "pull-requests" | "prs" => Ok(Phase::CreatePullRequests),
            _ => anyhow::bail!(
                "Invalid phase '{}'. Valid values: create-branches, update-files, commit, create-pull-requests",
                s
            ),
        }
    }
}

/// Outcome of one phase run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseReport {
    /// The request went out; counts are per returned item.
    Completed { succeeded: usize, failed: usize },
    /// A precondition failed; nothing was sent or changed.
    Skipped { reason: String },
    /// The batched request failed as a whole; nothing was changed.
    RequestFailed { message: String },
}

impl PhaseReport {
    pub fn is_completed(&self) -> bool {
        matches!(self, PhaseReport::Completed { .. })
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseReport::Completed { succeeded, failed } => {
                write!(f, "{} succeeded, {} failed", succeeded, failed)
            }
            PhaseReport::Skipped { reason } => write!(f, "skipped: {}", reason),
            PhaseReport::RequestFailed { message } => write!(f, "request failed: {}", message),
        }
    }
}

pub(crate) fn skipped(ctx: &Context, reason: &str) -> PhaseReport {
    tracing::info!(reason, "phase skipped");
    ctx.notifier.error(reason);
    PhaseReport::Skipped {
        reason: reason.to_string(),
    }
}

pub(crate) fn request_failed(ctx: &Context, what: &str, err: BackendError) -> PhaseReport {
    tracing::warn!(error = %err, "{} request failed", what);
    let message = format!("{} request failed. {}", what, err);
    ctx.notifier.error(&message);
    PhaseReport::RequestFailed { message }
}
