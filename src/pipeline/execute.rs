//! Running a pipeline's phases: the execute-all chain and individual mode.

use std::fmt;

use tokio::sync::watch;

use crate::context::Context;
use crate::errors::OrchestratorError;
use crate::models::{AddedDependency, ModeLock};
use crate::phases::{self, Phase, PhaseReport};

/// Progress of an execute-all run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    CreatingBranches,
    UpdatingFiles,
    Committing,
    CreatingPullRequests,
    Done,
    /// The chain stopped before finishing.
    Failed { message: String },
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionState::Done | ExecutionState::Failed { .. })
    }

    fn entering(phase: Phase) -> Self {
        match phase {
            Phase::CreateBranches => ExecutionState::CreatingBranches,
            Phase::UpdateFiles => ExecutionState::UpdatingFiles,
            Phase::Commit => ExecutionState::Committing,
            Phase::CreatePullRequests => ExecutionState::CreatingPullRequests,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Idle => write!(f, "idle"),
            ExecutionState::CreatingBranches => write!(f, "creating branches"),
            ExecutionState::UpdatingFiles => write!(f, "updating files"),
            ExecutionState::Committing => write!(f, "committing"),
            ExecutionState::CreatingPullRequests => write!(f, "creating pull requests"),
            ExecutionState::Done => write!(f, "done"),
            ExecutionState::Failed { message } => write!(f, "failed: {}", message),
        }
    }
}

/// Runs the four phases of a pipeline in order, publishing progress on a
/// watch channel.
pub struct ExecuteAll {
    ctx: Context,
    state: watch::Sender<ExecutionState>,
}

impl ExecuteAll {
    pub fn new(ctx: Context) -> Self {
        let (state, _) = watch::channel(ExecutionState::Idle);
        Self { ctx, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExecutionState {
        self.state.borrow().clone()
    }

    fn publish(&self, state: ExecutionState) {
        tracing::debug!(state = %state, "execute-all state");
        self.state.send_replace(state);
    }

    fn current(&self, id: &str) -> Result<AddedDependency, OrchestratorError> {
        self.ctx
            .store
            .pipeline(id)
            .ok_or_else(|| OrchestratorError::PipelineNotFound { id: id.to_string() })
    }

    /// Run create branches → update files → commit → create pull requests.
    ///
    /// The pipeline must be in execute-all mode and not locked. Per-phase
    /// outcomes are returned in order; an `Err` means the chain was cut short.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, id: &str) -> Result<Vec<(Phase, PhaseReport)>, OrchestratorError> {
        let pipeline = self.current(id)?;
        if !pipeline.execute_all {
            return Err(OrchestratorError::ExecuteAllDisabled { id: id.to_string() });
        }
        if pipeline.mode_lock.is_locked() {
            return Err(OrchestratorError::ModeLocked { id: id.to_string() });
        }

        match self.run_chain(id).await {
            Ok(reports) => {
                self.publish(ExecutionState::Done);
                tracing::info!(pipeline = %pipeline.name, "execute-all finished");
                Ok(reports)
            }
            Err(e) => {
                tracing::warn!(error = %e, "execute-all aborted");
                self.ctx
                    .notifier
                    .error(&format!("Execute all aborted. {}", e));
                self.publish(ExecutionState::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_chain(&self, id: &str) -> Result<Vec<(Phase, PhaseReport)>, OrchestratorError> {
        let ctx = &self.ctx;
        let mut reports = Vec::with_capacity(Phase::ALL.len());
        // Files produced by this run's update step; commit never sees older ones.
        let mut produced = Vec::new();

        for phase in Phase::ALL {
            self.publish(ExecutionState::entering(phase));
            let pipeline = self.current(id)?;
            let report = match phase {
                Phase::CreateBranches => phases::create_branches(ctx, &pipeline).await,
                Phase::UpdateFiles => {
                    let (report, files) = phases::update_files(ctx, &pipeline).await;
                    produced = files;
                    report
                }
                Phase::Commit => {
                    // Selection may have changed between update and commit.
                    let files: Vec<_> = produced
                        .iter()
                        .filter_map(|f| ctx.store.pom_files().iter().find(|s| s.id == f.id).cloned())
                        .collect();
                    phases::commit(ctx, &pipeline, &files).await
                }
                Phase::CreatePullRequests => phases::create_pull_requests(ctx, &pipeline).await,
            };
            tracing::info!(phase = %phase, outcome = %report, "phase finished");
            reports.push((phase, report));
        }
        Ok(reports)
    }
}

/// Run a single phase of a pipeline in individual mode, then latch the mode
/// lock so the pipeline can no longer switch to execute-all.
#[tracing::instrument(skip(ctx))]
pub async fn run_individual(ctx: &Context, id: &str, phase: Phase) -> Result<PhaseReport, OrchestratorError> {
    let pipeline = ctx
        .store
        .pipeline(id)
        .ok_or_else(|| OrchestratorError::PipelineNotFound { id: id.to_string() })?;
    if pipeline.execute_all {
        return Err(OrchestratorError::IndividualModeDisabled { id: id.to_string() });
    }

    let report = match phase {
        Phase::CreateBranches => phases::create_branches(ctx, &pipeline).await,
        Phase::UpdateFiles => phases::update_files(ctx, &pipeline).await.0,
        Phase::Commit => {
            let files = ctx.store.pom_files_for(id);
            phases::commit(ctx, &pipeline, &files).await
        }
        Phase::CreatePullRequests => phases::create_pull_requests(ctx, &pipeline).await,
    };

    ctx.store
        .update_pipeline(id, |p| p.mode_lock = ModeLock::Locked);
    Ok(report)
}
