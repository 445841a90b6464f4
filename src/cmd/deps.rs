//! Supported-dependency catalog commands: `depflow deps`.

use anyhow::Result;
use console::style;

use depflow::models::DependencyStatus;
use depflow::pipeline::{add_checked_pipelines, add_pipeline, sync_catalog, toggle_dependency};

use super::super::{Cli, DepsCommands};
use super::build_context;

pub async fn cmd_deps(cli: &Cli, command: DepsCommands) -> Result<()> {
    let (ctx, _config) = build_context(cli)?;

    match command {
        DepsCommands::Sync => {
            if !sync_catalog(&ctx).await {
                anyhow::bail!("Catalog sync failed");
            }
            print_catalog(&ctx);
        }
        DepsCommands::List => print_catalog(&ctx),
        DepsCommands::Toggle { name } => {
            let known = ctx
                .store
                .dependencies()
                .supported_dependencies
                .iter()
                .any(|d| d.name == name);
            if !known {
                anyhow::bail!("'{}' is not in the catalog. Run 'depflow deps sync' first.", name);
            }
            toggle_dependency(&ctx, &name);
            print_catalog(&ctx);
        }
        DepsCommands::Add { name: Some(name) } => match add_pipeline(&ctx, &name).await {
            Some(id) => println!("{}", id),
            None => anyhow::bail!("Failed to add pipeline for '{}'", name),
        },
        DepsCommands::Add { name: None } => {
            let added = add_checked_pipelines(&ctx).await;
            if added.is_empty() {
                println!("No checked dependencies were added.");
            }
            for id in added {
                println!("{}", id);
            }
        }
    }
    Ok(())
}

fn print_catalog(ctx: &depflow::context::Context) {
    let deps = ctx.store.dependencies();
    if deps.supported_dependencies.is_empty() {
        println!("Catalog is empty. Run 'depflow deps sync' to fetch it.");
        return;
    }
    println!();
    println!("{:<32} Status", "Dependency");
    println!("{:<32} ------", "--------------------------------");
    for dep in &deps.supported_dependencies {
        let status = match dep.status {
            DependencyStatus::Checked => style("checked").cyan(),
            DependencyStatus::CanBeAdded => style("available").dim(),
            DependencyStatus::Added => style("added").green(),
        };
        println!("{:<32} {}", dep.name, status);
    }
    println!();
}
