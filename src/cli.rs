use crate::config::Config;
use crate::dispatcher::{Dispatcher, DEPLOY, KUBECTL};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kubegate")]
#[command(about = "Gate. Check. Forward. - Role-based command gateway for kubectl")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authorize and run a kubectl command", disable_help_flag = true)]
    Kubectl {
        #[arg(long, env = "KUBEGATE_USER", help = "User issuing the command")]
        user: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(about = "Validate a deploy request", disable_help_flag = true)]
    Deploy {
        #[arg(long, env = "KUBEGATE_USER", help = "User issuing the command")]
        user: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(about = "Show the authorization verdict without running anything")]
    Check {
        #[arg(long, env = "KUBEGATE_USER", help = "User to evaluate")]
        user: String,

        #[arg(help = "kubectl subcommand, e.g. delete")]
        command: String,
    },

    #[command(about = "List current role claims")]
    Roles,

    #[command(about = "List deployable projects")]
    Projects,

    #[command(about = "Serve the command endpoint over HTTP")]
    Serve {
        #[arg(long, help = "Address to bind (defaults to config)")]
        bind: Option<String>,
    },

    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Init,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Kubectl { user, args } => dispatch(KUBECTL, &user, &args).await,
        Commands::Deploy { user, args } => dispatch(DEPLOY, &user, &args).await,
        Commands::Check { user, command } => {
            let config = Config::load()?;
            let dispatcher = Dispatcher::from_config(&config);
            let verdict = dispatcher.engine().authorize(&user, &command);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Commands::Roles => crate::claims::show_roles().await,
        Commands::Projects => {
            let config = Config::load()?;
            let dispatcher = Dispatcher::from_config(&config);
            let projects = dispatcher.deploy_validator().list_projects();
            print!("{}", crate::response::project_listing(&projects));
            Ok(())
        }
        Commands::Serve { bind } => {
            let config = Config::load()?;
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let dispatcher = Arc::new(Dispatcher::from_config(&config));
            crate::server::start_server(&bind, dispatcher).await
        }
        Commands::Config { action } => match action {
            Some(ConfigAction::Show) => crate::config::show_config().await,
            Some(ConfigAction::Init) => crate::config::init_config().await,
            None => crate::config::show_config().await,
        },
    }
}

async fn dispatch(command: &str, user: &str, args: &[String]) -> Result<()> {
    let config = Config::load()?;
    let dispatcher = Dispatcher::from_config(&config);
    print!("{}", dispatcher.handle(command, user, args).await);
    Ok(())
}
