//! Session, status and reset commands.

use anyhow::Result;
use console::style;

use depflow::models::DependencyStatus;
use depflow::session;

use super::super::Cli;
use super::build_context;

pub async fn cmd_login(cli: &Cli, username: &str, token: &str) -> Result<()> {
    let (ctx, _config) = build_context(cli)?;
    if !session::login(&ctx, username, token).await {
        anyhow::bail!("Login failed");
    }
    if !cli.quiet {
        println!("Set DEPFLOW_USERNAME and DEPFLOW_TOKEN to reuse these credentials.");
    }
    Ok(())
}

pub async fn cmd_logout(cli: &Cli) -> Result<()> {
    let (ctx, _config) = build_context(cli)?;
    session::logout(&ctx).await;
    Ok(())
}

pub async fn cmd_status(cli: &Cli) -> Result<()> {
    let (ctx, config) = build_context(cli)?;

    println!();
    println!("depflow status");
    println!("==============");
    println!();
    println!("Backend:   {}", config.base_url);
    println!("State dir: {}", config.state_dir.display());

    let session_status = match &config.username {
        None => style("no credentials (set DEPFLOW_USERNAME / DEPFLOW_TOKEN)".to_string()).dim(),
        Some(user) if session::check_session(&ctx).await => {
            style(format!("active ({})", user)).green()
        }
        Some(user) => style(format!("inactive ({})", user)).red(),
    };
    println!("Session:   {}", session_status);
    println!();

    let deps = ctx.store.dependencies();
    let checked = deps
        .supported_dependencies
        .iter()
        .filter(|d| d.status == DependencyStatus::Checked)
        .count();
    println!(
        "Catalog:   {} supported, {} checked",
        deps.supported_dependencies.len(),
        checked
    );
    println!("Pipelines: {}", deps.added_dependencies.len());
    for pipeline in &deps.added_dependencies {
        let mode = if pipeline.execute_all {
            "execute-all"
        } else if pipeline.mode_lock.is_locked() {
            "individual (locked)"
        } else {
            "individual"
        };
        println!(
            "  {:<24} {:<12} {:<20} {} repositories",
            pipeline.name,
            pipeline.selected_version,
            mode,
            ctx.store.repositories_for(&pipeline.id).len()
        );
    }
    let workspace = ctx.store.branch_actions();
    println!(
        "Workspace: {} project(s), {} selected repositories",
        workspace.projects.len(),
        workspace.selected_refs().len()
    );
    println!();
    Ok(())
}

pub fn cmd_reset(cli: &Cli, force: bool) -> Result<()> {
    use dialoguer::Confirm;

    let (ctx, config) = build_context(cli)?;

    if !force {
        let confirm = Confirm::new()
            .with_prompt("This will drop every pipeline, file and workspace entry. Are you sure?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("Reset cancelled");
            return Ok(());
        }
    }

    ctx.store.reset_all();
    println!("Reset complete ({})", config.state_dir.display());
    Ok(())
}
