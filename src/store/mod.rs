//! Normalized application state with collection-granular persistence.
//!
//! The store holds four independent collections, each behind its own `Arc`:
//!
//! | Collection              | Storage key             | Default                    |
//! |-------------------------|-------------------------|----------------------------|
//! | dependency catalog + pipelines | `dependenciesState` | empty catalog, no pipelines |
//! | dependent repositories  | `dependentRepositories` | empty list                 |
//! | pom files               | `pomFiles`              | empty list                 |
//! | branch-actions workspace| `branchActionsData`     | `BranchActionsData::default()` |
//!
//! Every mutation runs inside one lock acquisition. A collection's `Arc` is
//! replaced only when its content actually changed; after each commit the
//! store persists exactly the collections whose pointer differs from the
//! pre-commit snapshot.

pub mod storage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::*;
pub use storage::{FileStorage, MemoryStorage, Storage};
use storage::{BRANCH_ACTIONS_KEY, DEPENDENCIES_KEY, DEPENDENT_REPOSITORIES_KEY, POM_FILES_KEY};

/// A cheap, consistent snapshot of every collection.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub dependencies: Arc<DependenciesState>,
    pub dependent_repositories: Arc<Vec<DependentRepository>>,
    pub pom_files: Arc<Vec<PomFile>>,
    pub branch_actions: Arc<BranchActionsData>,
}

/// Clone-on-change edit: the slot gets a new `Arc` only if `f` changed the value.
fn edit<T: Clone + PartialEq, R>(slot: &mut Arc<T>, f: impl FnOnce(&mut T) -> R) -> R {
    let mut next = T::clone(slot);
    let out = f(&mut next);
    if next != **slot {
        *slot = Arc::new(next);
    }
    out
}

fn load_collection<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match storage.load(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt persisted state");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to load persisted state");
            T::default()
        }
    }
}

/// The single shared state container. Share it as `Arc<Store>`.
pub struct Store {
    state: Mutex<AppState>,
    storage: Arc<dyn Storage>,
}

impl Store {
    /// Open the store, rehydrating each collection independently.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let state = AppState {
            dependencies: Arc::new(load_collection(storage.as_ref(), DEPENDENCIES_KEY)),
            dependent_repositories: Arc::new(load_collection(
                storage.as_ref(),
                DEPENDENT_REPOSITORIES_KEY,
            )),
            pom_files: Arc::new(load_collection(storage.as_ref(), POM_FILES_KEY)),
            branch_actions: Arc::new(load_collection(storage.as_ref(), BRANCH_ACTIONS_KEY)),
        };
        Self {
            state: Mutex::new(state),
            storage,
        }
    }

    /// Store backed by memory only.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|source| crate::errors::StoreError::Serialize {
                key: key.to_string(),
                source,
            })
            .and_then(|raw| self.storage.save(key, &raw));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to persist state");
        }
    }

    fn persist_changes(&self, before: &AppState, after: &AppState) {
        if !Arc::ptr_eq(&before.dependencies, &after.dependencies) {
            self.persist(DEPENDENCIES_KEY, after.dependencies.as_ref());
        }
        if !Arc::ptr_eq(&before.dependent_repositories, &after.dependent_repositories) {
            self.persist(DEPENDENT_REPOSITORIES_KEY, after.dependent_repositories.as_ref());
        }
        if !Arc::ptr_eq(&before.pom_files, &after.pom_files) {
            self.persist(POM_FILES_KEY, after.pom_files.as_ref());
        }
        if !Arc::ptr_eq(&before.branch_actions, &after.branch_actions) {
            self.persist(BRANCH_ACTIONS_KEY, after.branch_actions.as_ref());
        }
    }

    fn commit<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.lock();
        let before = state.clone();
        let out = f(&mut state);
        self.persist_changes(&before, &state);
        out
    }

    /// Write every collection to storage, changed or not.
    pub fn flush(&self) {
        let state = self.lock().clone();
        self.persist(DEPENDENCIES_KEY, state.dependencies.as_ref());
        self.persist(DEPENDENT_REPOSITORIES_KEY, state.dependent_repositories.as_ref());
        self.persist(POM_FILES_KEY, state.pom_files.as_ref());
        self.persist(BRANCH_ACTIONS_KEY, state.branch_actions.as_ref());
    }

    // ---- reads ----

    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    pub fn dependencies(&self) -> Arc<DependenciesState> {
        self.lock().dependencies.clone()
    }

    pub fn dependent_repositories(&self) -> Arc<Vec<DependentRepository>> {
        self.lock().dependent_repositories.clone()
    }

    pub fn pom_files(&self) -> Arc<Vec<PomFile>> {
        self.lock().pom_files.clone()
    }

    pub fn branch_actions(&self) -> Arc<BranchActionsData> {
        self.lock().branch_actions.clone()
    }

    pub fn pipeline(&self, id: &str) -> Option<AddedDependency> {
        self.dependencies()
            .added_dependencies
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn repositories_for(&self, dependency_id: &str) -> Vec<DependentRepository> {
        self.dependent_repositories()
            .iter()
            .filter(|r| r.dependency_id == dependency_id)
            .cloned()
            .collect()
    }

    pub fn pom_files_for(&self, dependency_id: &str) -> Vec<PomFile> {
        self.pom_files()
            .iter()
            .filter(|f| f.dependency_id == dependency_id)
            .cloned()
            .collect()
    }

    // ---- dependency catalog ----

    /// Replace the catalog; names that already have a pipeline are marked added.
    pub fn set_supported_dependencies(&self, names: Vec<String>) {
        self.commit(|s| {
            edit(&mut s.dependencies, |deps| {
                let added: Vec<&str> = deps
                    .added_dependencies
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect();
                let catalog = names
                    .into_iter()
                    .map(|name| {
                        let status = if added.contains(&name.as_str()) {
                            DependencyStatus::Added
                        } else {
                            DependencyStatus::CanBeAdded
                        };
                        SupportedDependency { name, status }
                    })
                    .collect();
                deps.supported_dependencies = catalog;
            })
        })
    }

    /// Flip a catalog entry between `checked` and `can-be-added`.
    pub fn toggle_dependency_status(&self, name: &str) {
        self.commit(|s| {
            edit(&mut s.dependencies, |deps| {
                if let Some(dep) = deps.supported_dependencies.iter_mut().find(|d| d.name == name) {
                    dep.status = match dep.status {
                        DependencyStatus::Checked => DependencyStatus::CanBeAdded,
                        DependencyStatus::CanBeAdded => DependencyStatus::Checked,
                        DependencyStatus::Added => DependencyStatus::Added,
                    };
                }
            })
        })
    }

    pub fn update_dependency_status(&self, name: &str, status: DependencyStatus) {
        self.commit(|s| {
            edit(&mut s.dependencies, |deps| {
                if let Some(dep) = deps.supported_dependencies.iter_mut().find(|d| d.name == name) {
                    dep.status = status;
                }
            })
        })
    }

    // ---- pipelines ----

    /// Insert a fully assembled pipeline with its repositories and mark the
    /// dependency as added, in one commit.
    pub fn insert_pipeline(&self, pipeline: AddedDependency, repositories: Vec<DependentRepository>) {
        self.commit(|s| {
            let name = pipeline.name.clone();
            edit(&mut s.dependencies, |deps| {
                deps.added_dependencies.push(pipeline);
                if let Some(dep) = deps.supported_dependencies.iter_mut().find(|d| d.name == name) {
                    dep.status = DependencyStatus::Added;
                }
            });
            if !repositories.is_empty() {
                edit(&mut s.dependent_repositories, |repos| repos.extend(repositories));
            }
        })
    }

    /// Run `f` against one pipeline. Returns `None` if it does not exist.
    pub fn update_pipeline<R>(&self, id: &str, f: impl FnOnce(&mut AddedDependency) -> R) -> Option<R> {
        self.commit(|s| {
            edit(&mut s.dependencies, |deps| {
                deps.added_dependencies.iter_mut().find(|d| d.id == id).map(f)
            })
        })
    }

    /// Remove a pipeline with every repository and file that belongs to it,
    /// restoring the catalog entry to `can-be-added`. Returns whether anything
    /// was removed.
    pub fn remove_pipeline_cascade(&self, id: &str) -> bool {
        self.commit(|s| {
            let removed = edit(&mut s.dependencies, |deps| {
                let Some(pos) = deps.added_dependencies.iter().position(|d| d.id == id) else {
                    return false;
                };
                let pipeline = deps.added_dependencies.remove(pos);
                if let Some(dep) = deps
                    .supported_dependencies
                    .iter_mut()
                    .find(|d| d.name == pipeline.name)
                {
                    dep.status = DependencyStatus::CanBeAdded;
                }
                true
            });
            edit(&mut s.dependent_repositories, |repos| {
                repos.retain(|r| r.dependency_id != id)
            });
            edit(&mut s.pom_files, |files| files.retain(|f| f.dependency_id != id));
            removed
        })
    }

    // ---- dependent repositories ----

    pub fn update_repository(&self, id: &str, patch: RepositoryPatch) -> bool {
        self.commit(|s| {
            edit(&mut s.dependent_repositories, |repos| {
                match repos.iter_mut().find(|r| r.id == id) {
                    Some(repo) => {
                        patch.apply(repo);
                        true
                    }
                    None => false,
                }
            })
        })
    }

    pub fn update_repository_by_attributes(
        &self,
        dependency_id: &str,
        project_name: &str,
        repo_name: &str,
        patch: RepositoryPatch,
    ) -> bool {
        self.commit(|s| {
            edit(&mut s.dependent_repositories, |repos| {
                match repos.iter_mut().find(|r| {
                    r.dependency_id == dependency_id
                        && r.project_name == project_name
                        && r.repo_name == repo_name
                }) {
                    Some(repo) => {
                        patch.apply(repo);
                        true
                    }
                    None => false,
                }
            })
        })
    }

    /// Set a selection flag on every usable repository of a pipeline.
    pub fn set_all_repository_flags(&self, dependency_id: &str, flag: RepositoryFlag, on: bool) {
        self.commit(|s| {
            edit(&mut s.dependent_repositories, |repos| {
                for repo in repos
                    .iter_mut()
                    .filter(|r| r.dependency_id == dependency_id && r.is_usable())
                {
                    flag.patch(on).apply(repo);
                }
            })
        })
    }

    pub fn update_application(&self, repo_id: &str, app_id: &str, patch: ApplicationPatch) -> bool {
        self.commit(|s| {
            edit(&mut s.dependent_repositories, |repos| {
                let app = repos
                    .iter_mut()
                    .find(|r| r.id == repo_id)
                    .and_then(|r| r.dependent_applications.iter_mut().find(|a| a.id == app_id));
                match app {
                    Some(app) => {
                        patch.apply(app);
                        true
                    }
                    None => false,
                }
            })
        })
    }

    /// Toggle `updateDpendencyVersion` on every application of the pipeline's
    /// usable repositories.
    pub fn set_all_applications(&self, dependency_id: &str, on: bool) {
        self.commit(|s| {
            edit(&mut s.dependent_repositories, |repos| {
                for repo in repos
                    .iter_mut()
                    .filter(|r| r.dependency_id == dependency_id && r.is_usable())
                {
                    for app in &mut repo.dependent_applications {
                        app.update_dependency_version = on;
                    }
                }
            })
        })
    }

    // ---- pom files ----

    /// Insert or replace a file by id.
    pub fn upsert_pom_file(&self, file: PomFile) {
        self.commit(|s| {
            edit(&mut s.pom_files, |files| {
                match files.iter_mut().find(|f| f.id == file.id) {
                    Some(existing) => *existing = file,
                    None => files.push(file),
                }
            })
        })
    }

    pub fn remove_pom_file(&self, id: &str) -> bool {
        self.commit(|s| {
            edit(&mut s.pom_files, |files| {
                let before = files.len();
                files.retain(|f| f.id != id);
                files.len() != before
            })
        })
    }

    pub fn update_pom_file(&self, id: &str, patch: PomFilePatch) -> bool {
        self.commit(|s| {
            edit(&mut s.pom_files, |files| match files.iter_mut().find(|f| f.id == id) {
                Some(file) => {
                    patch.apply(file);
                    true
                }
                None => false,
            })
        })
    }

    pub fn set_all_files_selected(&self, dependency_id: &str, on: bool) {
        self.commit(|s| {
            edit(&mut s.pom_files, |files| {
                for file in files.iter_mut().filter(|f| f.dependency_id == dependency_id) {
                    file.selected_for_commit = on;
                }
            })
        })
    }

    // ---- branch-actions workspace ----

    pub fn update_workspace<R>(&self, f: impl FnOnce(&mut BranchActionsData) -> R) -> R {
        self.commit(|s| edit(&mut s.branch_actions, f))
    }

    // ---- reset ----

    /// Reset every collection to its default and drop all persisted entries.
    pub fn reset_all(&self) {
        let mut state = self.lock();
        *state = AppState::default();
        for key in storage::ALL_KEYS {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to remove persisted state");
            }
        }
    }
}
