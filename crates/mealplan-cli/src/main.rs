mod config;
mod generate_cmd;
mod health_cmd;
mod history_cmd;
#[cfg(test)]
mod test_util;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use mealplan_core::ClientConfig;
use mealplan_core::backend::DEFAULT_HISTORY_LIMIT;

use config::CliOverrides;
use tui::app::DisplayMode;

#[derive(Parser)]
#[command(name = "mealplan", about = "Generate and view meal plans from the meal plan server")]
struct Cli {
    /// Server base URL (overrides MEALPLAN_BASE_URL env var)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// User to generate for (overrides MEALPLAN_USER_ID env var)
    #[arg(long, global = true)]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mealplan config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Request a new meal plan and print it
    Generate {
        /// Only report whether generation succeeded
        #[arg(long)]
        quiet: bool,
    },
    /// List previously generated meal plans
    History {
        /// Maximum number of plans to list
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
    /// Check that the meal plan server is up
    Health,
    /// Launch the interactive meal plan screen
    Screen {
        /// Do not display the generated plan, only the request status
        #[arg(long)]
        quiet: bool,
    },
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Execute the `mealplan init` command: write config file.
fn cmd_init(cli_base_url: Option<&str>, cli_user_id: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    // Validate before writing so a bad value never lands in the file.
    let resolved = ClientConfig::new(
        cli_base_url.unwrap_or(ClientConfig::DEFAULT_BASE_URL),
        cli_user_id.unwrap_or(ClientConfig::DEFAULT_USER_ID),
    )?;

    let cfg = config::ConfigFile {
        server: config::ServerSection {
            base_url: resolved.base_url.to_string(),
        },
        user: config::UserSection {
            id: resolved.user_id.to_string(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  server.base_url = {}", cfg.server.base_url);
    println!("  user.id = {}", cfg.user.id);

    Ok(())
}

fn init_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Log lines would corrupt the alternate screen, so the TUI stays silent
    // unless RUST_LOG asks otherwise.
    let default_directive = match cli.command {
        Commands::Screen { .. } => "off",
        _ => "info",
    };
    init_tracing(default_directive);

    let overrides = CliOverrides {
        base_url: cli.base_url.as_deref(),
        user_id: cli.user_id.as_deref(),
    };

    match cli.command {
        Commands::Init { force } => {
            cmd_init(overrides.base_url, overrides.user_id, force)?;
        }
        Commands::Generate { quiet } => {
            let resolved = config::resolve(overrides)?;
            generate_cmd::run_generate(&resolved, quiet).await?;
        }
        Commands::History { limit } => {
            let resolved = config::resolve(overrides)?;
            history_cmd::run_history(&resolved, limit).await?;
        }
        Commands::Health => {
            let resolved = config::resolve(overrides)?;
            health_cmd::run_health(&resolved).await?;
        }
        Commands::Screen { quiet } => {
            let resolved = config::resolve(overrides)?;
            let display = if quiet {
                DisplayMode::Discard
            } else {
                DisplayMode::ShowResult
            };
            tracing::info!(endpoint = %resolved.generate_url(), "opening meal plan screen");
            tui::run_screen(&resolved, display).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mealplan", &mut std::io::stdout());
        }
    }

    Ok(())
}
