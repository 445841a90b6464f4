//! Branch-actions workspace commands: `depflow workspace`.

use anyhow::Result;
use console::{Emoji, style};

use depflow::context::Context;
use depflow::models::{WorkspaceEdit, WorkspaceRepository};
use depflow::ui::icons::{CHECK, CROSS, LINK};
use depflow::workspace;

use super::super::{Cli, WorkspaceCommands, WorkspaceField};
use super::{build_context, wait_for_interrupt};

pub async fn cmd_workspace(cli: &Cli, command: WorkspaceCommands) -> Result<()> {
    let (ctx, config) = build_context(cli)?;

    match command {
        WorkspaceCommands::Show => print_workspace(&ctx),
        WorkspaceCommands::AddProject { name } => {
            if !workspace::add_project(&ctx, &name).await {
                anyhow::bail!("Failed to add project {}", name);
            }
            print_workspace(&ctx);
        }
        WorkspaceCommands::RemoveProject { name } => workspace::remove_project(&ctx, &name),
        WorkspaceCommands::Toggle { project, repo } => {
            if !workspace::toggle_repository(&ctx, &project, &repo) {
                anyhow::bail!("No repository {}/{} in the workspace", project, repo);
            }
        }
        WorkspaceCommands::Set { field, value } => {
            let edit = match field {
                WorkspaceField::FromBranch => WorkspaceEdit::FromBranch(value),
                WorkspaceField::NewBranch => WorkspaceEdit::NewBranch(value),
                WorkspaceField::PrFromBranch => WorkspaceEdit::PrFromBranch(value),
                WorkspaceField::PrToBranch => WorkspaceEdit::PrToBranch(value),
                WorkspaceField::PrTitle => WorkspaceEdit::PrTitle(value),
                WorkspaceField::PrDescription => WorkspaceEdit::PrDescription(value),
            };
            workspace::edit_workspace(&ctx, edit);
        }
        WorkspaceCommands::CreateBranches => {
            let report = workspace::create_branches(&ctx).await;
            println!("create-branches: {}", report);
        }
        WorkspaceCommands::CreatePrs => {
            let report = workspace::create_pull_requests(&ctx).await;
            println!("create-pull-requests: {}", report);
        }
        WorkspaceCommands::Builds { project, watch } => {
            if watch {
                let handle = workspace::watch_builds(ctx.clone(), project, config.poll_interval);
                println!(
                    "Polling builds every {}s, press Ctrl-C to stop.",
                    config.poll_interval.as_secs()
                );
                wait_for_interrupt().await?;
                handle.stop();
            } else {
                let report = workspace::fetch_builds(&ctx, &project).await;
                println!("builds: {}", report);
            }
            print_workspace(&ctx);
        }
    }
    Ok(())
}

fn print_repository(repo: &WorkspaceRepository) {
    println!(
        "    [{}] {}",
        if repo.selected { "x" } else { " " },
        repo.name
    );
    let icon = |status: &str| -> Emoji<'static, 'static> {
        if depflow::backend::types::is_error_status(status) {
            CROSS
        } else {
            CHECK
        }
    };
    if let Some(status) = &repo.create_branches_status {
        println!(
            "        {} branch: {}",
            icon(status),
            repo.create_branches_message.as_deref().unwrap_or("")
        );
    }
    if let Some(status) = &repo.create_pull_request_status {
        println!(
            "        {} pull request: {}",
            icon(status),
            repo.create_pull_request_message.as_deref().unwrap_or("")
        );
    }
    if let Some(link) = &repo.pull_request_link {
        println!("        {} {}", LINK, link);
    }
    if let Some(build) = repo.build {
        println!(
            "        builds: {} ok, {} failed, {} running",
            build.successful, build.failed, build.in_progress
        );
    }
}

fn print_workspace(ctx: &Context) {
    let ws = ctx.store.branch_actions();
    println!();
    println!("Branches:      {} -> {}", ws.from_branch, ws.new_branch);
    println!("Pull requests: {} -> {}", ws.pr_from_branch, ws.pr_to_branch);
    if !ws.pr_title.is_empty() {
        println!("PR title:      {}", ws.pr_title);
    }
    println!(
        "Available:     {}",
        style(ws.supported_projects.join(", ")).dim()
    );
    println!();
    if ws.projects.is_empty() {
        println!("No projects. Add one with 'depflow workspace add-project <name>'.");
    }
    for project in &ws.projects {
        println!("  {}", style(&project.name).bold());
        for repo in project
            .selected_repositories
            .iter()
            .chain(project.repositories.iter())
        {
            print_repository(repo);
        }
    }
    println!();
}
