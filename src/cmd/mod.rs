//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `session`       | `Login`, `Logout`, `Status`, `Reset`               |
//! | `config`        | `Config`                                           |
//! | `deps`          | `Deps`                                             |
//! | `pipeline`      | `Pipeline`                                         |
//! | `workspace`     | `Workspace`                                        |

pub mod config;
pub mod deps;
pub mod pipeline;
pub mod session;
pub mod workspace;

pub use config::cmd_config;
pub use deps::cmd_deps;
pub use pipeline::cmd_pipeline;
pub use session::{cmd_login, cmd_logout, cmd_reset, cmd_status};
pub use workspace::cmd_workspace;

use anyhow::{Context as _, Result};
use std::sync::Arc;

use depflow::backend::HttpBackend;
use depflow::config::{CliOverrides, Config};
use depflow::context::Context;
use depflow::session::basic_auth_header;
use depflow::store::{FileStorage, Store};
use depflow::ui::{ConsoleNotifier, Loader, NoopLoader, SpinnerLoader};

use super::Cli;

pub fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(
        cli.config.as_deref(),
        CliOverrides {
            base_url: cli.base_url.clone(),
            state_dir: cli.state_dir.clone(),
        },
    )
}

/// Open the store and wire the backend, notifier and loader from configuration.
///
/// Credentials from `DEPFLOW_USERNAME`/`DEPFLOW_TOKEN` are attached to every
/// request without a separate login round trip.
pub fn build_context(cli: &Cli) -> Result<(Context, Config)> {
    let config = load_config(cli)?;
    config.ensure_state_dir()?;

    let store = Arc::new(Store::open(Arc::new(FileStorage::new(
        config.state_dir.clone(),
    ))));
    let backend = Arc::new(
        HttpBackend::new(&config.base_url, config.endpoints.clone())
            .context("Failed to create the backend client")?,
    );
    if let (Some(username), Some(token)) = (&config.username, &config.token) {
        backend.set_authorization(Some(basic_auth_header(username, token)));
    }
    let loader: Arc<dyn Loader> = if cli.quiet {
        Arc::new(NoopLoader)
    } else {
        Arc::new(SpinnerLoader::new())
    };

    let ctx = Context::new(store, backend, Arc::new(ConsoleNotifier::new(cli.quiet)), loader);
    Ok((ctx, config))
}

/// Resolve a pipeline by id, or by dependency name.
pub fn find_pipeline(ctx: &Context, key: &str) -> Result<depflow::models::AddedDependency> {
    let deps = ctx.store.dependencies();
    deps.added_dependencies
        .iter()
        .find(|d| d.id == key)
        .or_else(|| deps.added_dependencies.iter().find(|d| d.name == key))
        .cloned()
        .with_context(|| format!("No pipeline with id or name '{}'", key))
}

/// Block until Ctrl-C.
pub async fn wait_for_interrupt() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")
}
