use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::cancel::CancelFlag;
use crate::cloud::{CloudClient, DEFAULT_LIST_LIMIT};
use crate::commands::list::{self, ListOptions};
use crate::commands::prune::{self, deletion_cap, PruneOptions, DEFAULT_PRUNE_LIMIT};
use crate::commands::{CommandStatus, Target};
use crate::config::Config;
use crate::error::require_non_blank;

#[derive(Parser)]
#[command(name = "ccbuild")]
#[command(author, version, about = "Commerce Cloud build pruner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./ccbuild.toml or the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Clone, Default)]
struct ConnectionArgs {
    /// Build API base URL
    #[arg(long, env = "CC_BASE_URL")]
    base_url: Option<String>,

    /// Project ID
    #[arg(long, env = "CC_PROJECT_ID")]
    project_id: Option<String>,

    /// Environment ID
    #[arg(long, env = "CC_ENVIRONMENT_ID")]
    environment_id: Option<String>,

    /// Personal access token
    #[arg(long, env = "CC_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List builds for a project/environment
    List {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Maximum number of builds to fetch [default: 50]
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Include builds that cannot be deleted
        #[arg(long)]
        include_non_deletable: bool,

        /// Render the builds as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete builds older than a certain age
    Prune {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Only delete builds created before now minus this duration (e.g. 30d, P2DT3H)
        #[arg(long)]
        older_than: String,

        /// Maximum number of builds to inspect [default: 200]
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Maximum number of builds to delete (negative means unlimited)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max: i64,

        /// Only print builds that would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

/// Connection values after merging flags, environment and config file.
#[derive(Debug, Clone)]
struct Connection {
    base_url: String,
    token: String,
    target: Target,
}

impl ConnectionArgs {
    /// Fills unset values from the config file and checks that nothing is missing.
    fn resolve(&self, config: &Config) -> crate::error::Result<Connection> {
        let pick = |flag: &Option<String>, file: &Option<String>| -> Option<String> {
            flag.as_deref()
                .filter(|v| !v.trim().is_empty())
                .or(file.as_deref())
                .map(ToString::to_string)
        };

        let base_url = pick(&self.base_url, &config.base_url);
        let token = pick(&self.token, &config.token);
        let project_id = pick(&self.project_id, &config.project_id);
        let environment_id = pick(&self.environment_id, &config.environment_id);

        let base_url = require_non_blank(base_url.as_deref(), "--base-url or CC_BASE_URL must be provided")?;
        let token = require_non_blank(token.as_deref(), "--token or CC_TOKEN must be provided")?;
        let project_id =
            require_non_blank(project_id.as_deref(), "--project-id or CC_PROJECT_ID must be provided")?;
        let environment_id = require_non_blank(
            environment_id.as_deref(),
            "--environment-id or CC_ENVIRONMENT_ID must be provided",
        )?;

        Ok(Connection {
            base_url: base_url.to_string(),
            token: token.to_string(),
            target: Target {
                project_id: project_id.to_string(),
                environment_id: environment_id.to_string(),
            },
        })
    }
}

impl Cli {
    pub async fn execute(&self) -> Result<CommandStatus> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::List {
                connection,
                limit,
                include_non_deletable,
                json,
            } => {
                let connection = connection.resolve(&config)?;
                let client = CloudClient::new(&connection.base_url, &connection.token)?;
                let options = ListOptions {
                    limit: limit.or(config.list_limit).unwrap_or(DEFAULT_LIST_LIMIT),
                    include_non_deletable: *include_non_deletable,
                    json: *json,
                };
                info!("Using build API at {}", client.base_url());
                list::execute(&client, &connection.target, &options).await
            }
            Commands::Prune {
                connection,
                older_than,
                limit,
                max,
                dry_run,
            } => {
                let options = PruneOptions {
                    older_than: older_than.clone(),
                    limit: limit.or(config.prune_limit).unwrap_or(DEFAULT_PRUNE_LIMIT),
                    max: deletion_cap(*max),
                    dry_run: *dry_run,
                };
                // Reject a bad retention before anything touches the network.
                prune::cutoff_for(&options.older_than, chrono::Utc::now())?;

                let connection = connection.resolve(&config)?;
                let client = CloudClient::new(&connection.base_url, &connection.token)?;
                info!("Using build API at {}", client.base_url());

                let cancel = CancelFlag::new();
                if !options.dry_run {
                    cancel.cancel_on_ctrl_c();
                }
                prune::execute(&client, &connection.target, &options, &cancel).await
            }
        }
    }
}
