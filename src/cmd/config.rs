//! Configuration view and validation commands: `depflow config`.

use anyhow::Result;
use std::path::PathBuf;

use depflow::config::{CONFIG_FILE_NAME, DepflowToml};

use super::super::{Cli, ConfigCommands};
use super::load_config;

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("depflow configuration");
            println!("=====================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}; using defaults.", CONFIG_FILE_NAME, config_path.display());
            }
            println!();

            let config = load_config(cli)?;
            println!("Effective values (with env/CLI overrides):");
            println!("  base_url = \"{}\"", config.base_url);
            println!("  state_dir = \"{}\"", config.state_dir.display());
            println!("  poll_interval_secs = {}", config.poll_interval.as_secs());
            println!(
                "  credentials = {}",
                if config.username.is_some() && config.token.is_some() {
                    "from environment"
                } else {
                    "not set"
                }
            );
            println!();
            println!("Endpoints:");
            let e = &config.endpoints;
            for (name, path) in [
                ("validate_credentials", &e.validate_credentials),
                ("check_auth_token", &e.check_auth_token),
                ("logout", &e.logout),
                ("get_branches", &e.get_branches),
                ("create_branches", &e.create_branches),
                ("create_pull_requests", &e.create_pull_requests),
                ("update_dependency", &e.update_dependency),
                ("create_commit", &e.create_commit),
                ("get_repositories", &e.get_repositories),
                ("get_pull_request_builds", &e.get_pull_request_builds),
                ("get_supported_dependencies", &e.get_supported_dependencies),
                ("dependent_apps_and_versions", &e.dependent_apps_and_versions),
            ] {
                println!("  {:<28} {}", name, path);
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
                return Ok(());
            }

            let toml = DepflowToml::load(&config_path)?;
            let problems = toml.validate();

            if problems.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration problems:");
                for problem in &problems {
                    println!("  - {}", problem);
                }
                println!();
                anyhow::bail!("{} configuration problem(s)", problems.len());
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DepflowToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] base_url and [backend.endpoints] paths");
            println!("  - [storage] state_dir");
            println!("  - [polling] interval_secs");
            println!();
        }
    }

    Ok(())
}
