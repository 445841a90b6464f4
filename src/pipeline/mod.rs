//! Dependency pipelines: lifecycle, catalog, field edits and execution modes.

pub mod catalog;
pub mod execute;
pub mod lifecycle;

use crate::errors::OrchestratorError;
use crate::models::PipelineEdit;
use crate::store::Store;

pub use catalog::{add_checked_pipelines, sync_catalog, toggle_dependency};
pub use execute::{ExecuteAll, ExecutionState, run_individual};
pub use lifecycle::{add_pipeline, refresh_pipeline, remove_pipeline};

fn not_found(id: &str) -> OrchestratorError {
    OrchestratorError::PipelineNotFound { id: id.to_string() }
}

/// Switch a pipeline between execute-all and individual mode.
///
/// Fails with `ModeLocked` once any individual phase has run.
pub fn set_execute_all(store: &Store, id: &str, on: bool) -> Result<(), OrchestratorError> {
    store
        .update_pipeline(id, |p| {
            if p.mode_lock.is_locked() {
                return Err(OrchestratorError::ModeLocked { id: id.to_string() });
            }
            p.execute_all = on;
            Ok(())
        })
        .ok_or_else(|| not_found(id))?
}

pub fn edit_pipeline(store: &Store, id: &str, edit: PipelineEdit) -> Result<(), OrchestratorError> {
    store
        .update_pipeline(id, |p| p.apply(edit))
        .ok_or_else(|| not_found(id))
}

/// Select a version and regenerate the commit message and PR texts.
pub fn select_version(store: &Store, id: &str, version: &str) -> Result<(), OrchestratorError> {
    store
        .update_pipeline(id, |p| p.select_version(version))
        .ok_or_else(|| not_found(id))
}

/// Derive `feature/<ticket>` into the branch fields.
pub fn set_ticket(store: &Store, id: &str, ticket: &str) -> Result<(), OrchestratorError> {
    store
        .update_pipeline(id, |p| p.set_ticket(ticket))
        .ok_or_else(|| not_found(id))
}
