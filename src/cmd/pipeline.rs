//! Dependency pipeline commands: `depflow pipeline`.

use anyhow::Result;
use console::{Emoji, style};

use depflow::context::Context;
use depflow::models::{AddedDependency, CommitStatus, PipelineEdit, RepositoryFlag};
use depflow::phases::{self, Phase};
use depflow::pipeline::{
    self, ExecuteAll, refresh_pipeline, remove_pipeline, run_individual, set_execute_all,
};
use depflow::ui::icons::{BRANCH, CHECK, CROSS, LINK};

use super::super::{Cli, Mode, PipelineCommands, PipelineField, SelectTarget};
use super::{build_context, find_pipeline, wait_for_interrupt};

pub async fn cmd_pipeline(cli: &Cli, command: PipelineCommands) -> Result<()> {
    let (ctx, config) = build_context(cli)?;

    match command {
        PipelineCommands::List => cmd_list(&ctx),
        PipelineCommands::Show { pipeline } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            print_pipeline(&ctx, &pipeline);
        }
        PipelineCommands::Remove { pipeline } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            remove_pipeline(&ctx, &pipeline.id);
            println!("Removed {} ({})", pipeline.name, pipeline.id);
        }
        PipelineCommands::Refresh { pipeline } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            match refresh_pipeline(&ctx, &pipeline.id).await {
                Some(id) => println!("{}", id),
                None => anyhow::bail!("Failed to refresh {}", pipeline.name),
            }
        }
        PipelineCommands::Mode { pipeline, mode } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            set_execute_all(&ctx.store, &pipeline.id, matches!(mode, Mode::ExecuteAll))?;
        }
        PipelineCommands::Set {
            pipeline,
            field,
            value,
        } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            pipeline::edit_pipeline(&ctx.store, &pipeline.id, field_edit(field, value))?;
        }
        PipelineCommands::Version { pipeline, version } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            if !pipeline.versions.iter().any(|v| v.name == version) {
                anyhow::bail!("{} has no version '{}'", pipeline.name, version);
            }
            pipeline::select_version(&ctx.store, &pipeline.id, &version)?;
        }
        PipelineCommands::Ticket { pipeline, ticket } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            pipeline::set_ticket(&ctx.store, &pipeline.id, &ticket)?;
        }
        PipelineCommands::Select {
            pipeline,
            target,
            off,
        } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            let on = !off;
            match target {
                SelectTarget::Branches => {
                    ctx.store
                        .set_all_repository_flags(&pipeline.id, RepositoryFlag::CreateBranches, on)
                }
                SelectTarget::Prs => ctx.store.set_all_repository_flags(
                    &pipeline.id,
                    RepositoryFlag::CreatePullRequests,
                    on,
                ),
                SelectTarget::Apps => ctx.store.set_all_applications(&pipeline.id, on),
                SelectTarget::Files => ctx.store.set_all_files_selected(&pipeline.id, on),
            }
        }
        PipelineCommands::Run { pipeline, phase } => {
            let phase: Phase = phase.parse()?;
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            let report = run_individual(&ctx, &pipeline.id, phase).await?;
            println!("{}: {}", phase, report);
        }
        PipelineCommands::ExecuteAll { pipeline } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            let runner = ExecuteAll::new(ctx.clone());
            let mut states = runner.subscribe();
            let printer = tokio::spawn(async move {
                while states.changed().await.is_ok() {
                    let state = states.borrow_and_update().clone();
                    tracing::info!(state = %state, "execute-all progress");
                }
            });

            let result = runner.run(&pipeline.id).await;
            drop(runner);
            printer.await.ok();

            for (phase, report) in result? {
                println!("{:<22} {}", phase.to_string(), report);
            }
        }
        PipelineCommands::Builds { pipeline, watch } => {
            let pipeline = find_pipeline(&ctx, &pipeline)?;
            if watch {
                let handle = phases::watch_builds(ctx.clone(), pipeline.id.clone(), config.poll_interval);
                println!(
                    "Polling builds every {}s, press Ctrl-C to stop.",
                    config.poll_interval.as_secs()
                );
                wait_for_interrupt().await?;
                handle.stop();
            } else {
                let report = phases::fetch_builds(&ctx, &pipeline).await;
                println!("builds: {}", report);
            }
            print_pipeline(&ctx, &pipeline);
        }
    }
    Ok(())
}

fn field_edit(field: PipelineField, value: String) -> PipelineEdit {
    match field {
        PipelineField::FromBranch => PipelineEdit::FromBranch(value),
        PipelineField::NewBranch => PipelineEdit::NewBranch(value),
        PipelineField::PrFromBranch => PipelineEdit::PrFromBranch(value),
        PipelineField::ToBranch => PipelineEdit::ToBranch(value),
        PipelineField::UpdateFileBranch => PipelineEdit::UpdateFileBranch(value),
        PipelineField::CommitMessage => PipelineEdit::CommitMessage(value),
        PipelineField::PrTitle => PipelineEdit::PullRequestTitle(value),
        PipelineField::PrDescription => PipelineEdit::PullRequestDescription(value),
    }
}

fn cmd_list(ctx: &Context) {
    let deps = ctx.store.dependencies();
    if deps.added_dependencies.is_empty() {
        println!("No pipelines. Add one with 'depflow deps add <name>'.");
        return;
    }
    println!();
    println!("{:<38} {:<24} {:<12} Mode", "Id", "Dependency", "Version");
    println!(
        "{:<38} {:<24} {:<12} ----",
        "--------------------------------------", "------------------------", "-------"
    );
    for p in &deps.added_dependencies {
        let mode = if p.execute_all {
            style("execute-all").cyan()
        } else if p.mode_lock.is_locked() {
            style("individual (locked)").yellow()
        } else {
            style("individual").dim()
        };
        println!("{:<38} {:<24} {:<12} {}", p.id, p.name, p.selected_version, mode);
    }
    println!();
}

fn status_icon(status: &str) -> Emoji<'static, 'static> {
    if depflow::backend::types::is_error_status(status) {
        CROSS
    } else {
        CHECK
    }
}

fn print_pipeline(ctx: &Context, pipeline: &AddedDependency) {
    println!();
    println!("{} {}", style(&pipeline.name).bold(), style(&pipeline.id).dim());
    println!("  version:            {}", pipeline.selected_version);
    println!("  from branch:        {}", pipeline.from_branch);
    println!("  new branch:         {}", pipeline.new_branch);
    println!("  update-file branch: {}", pipeline.update_file_branch);
    println!("  PR {} -> {}", pipeline.pr_from_branch, pipeline.to_branch);
    println!("  PR title:           {}", pipeline.pull_request_title);
    println!("  commit message:     {}", pipeline.effective_commit_message());
    println!();

    for repo in ctx.store.repositories_for(&pipeline.id) {
        println!(
            "  {} {}/{}  [branches: {}] [prs: {}]",
            BRANCH,
            repo.project_name,
            repo.repo_name,
            if repo.create_branches { "x" } else { " " },
            if repo.create_pull_requests { "x" } else { " " },
        );
        if let Some(error) = &repo.error {
            println!("      {} {}", CROSS, style(error).red());
        }
        if !repo.create_branches_status.is_empty() {
            println!(
                "      {} branch: {}",
                status_icon(&repo.create_branches_status),
                repo.create_branches_message
            );
        }
        if !repo.create_pull_requests_status.is_empty() {
            println!(
                "      {} pull request: {}",
                status_icon(&repo.create_pull_requests_status),
                repo.create_pull_requests_message
            );
        }
        if !repo.pr_link.is_empty() {
            println!("      {} {}", LINK, repo.pr_link);
        }
        if let Some(build) = repo.build {
            println!(
                "      builds: {} ok, {} failed, {} running, {} cancelled, {} unknown",
                build.successful, build.failed, build.in_progress, build.cancelled, build.unknown
            );
        }
        for app in &repo.dependent_applications {
            let module = if app.module_name.is_empty() {
                "(root)"
            } else {
                app.module_name.as_str()
            };
            println!(
                "      [{}] {:<20} {}",
                if app.update_dependency_version { "x" } else { " " },
                module,
                app.update_message.as_deref().unwrap_or("")
            );
        }
    }

    let files = ctx.store.pom_files_for(&pipeline.id);
    if !files.is_empty() {
        println!();
        println!("  Files:");
        for file in files {
            let status = match file.commit_status {
                CommitStatus::Pending => style(file.commit_status.to_string()).dim(),
                CommitStatus::Committed => style(file.commit_status.to_string()).green(),
                CommitStatus::Error => style(file.commit_status.to_string()).red(),
            };
            println!(
                "    [{}] {}/{}/{} {} {}",
                if file.selected_for_commit { "x" } else { " " },
                file.repo_name,
                file.module_name,
                file.file_name,
                status,
                file.commit_status_message
            );
        }
    }
    println!();
}
