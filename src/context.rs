use std::sync::Arc;

use crate::backend::Backend;
use crate::store::Store;
use crate::ui::{Loader, LoaderGuard, Notifier};

/// Collaborators shared by every orchestration operation.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<Store>,
    pub backend: Arc<dyn Backend>,
    pub notifier: Arc<dyn Notifier>,
    pub loader: Arc<dyn Loader>,
}

impl Context {
    pub fn new(
        store: Arc<Store>,
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        loader: Arc<dyn Loader>,
    ) -> Self {
        Self {
            store,
            backend,
            notifier,
            loader,
        }
    }

    /// Show the loader until the returned guard drops.
    pub fn busy(&self) -> LoaderGuard<'_> {
        LoaderGuard::new(self.loader.as_ref())
    }
}
