use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcphost_core::config::{self, Config};
use mcphost_core::{
    AgentLoop, InteractionLogger, ManagerOptions, ToolClientManager, create_chat,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod onboard;
mod render;
mod repl;

#[derive(Parser)]
#[command(name = "mcphost")]
#[command(about = "mcphost - drive tool servers from a chat model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive configuration wizard
    Onboard,
    /// Chat with the agent (REPL unless --message is given)
    Chat {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List tools, optionally for one server
    Tools { server: Option<String> },
    /// Show a tool's input schema
    Schema { server: String, tool: String },
    /// Call a tool with JSON arguments
    Call {
        server: String,
        tool: String,
        #[arg(default_value = "{}")]
        args: String,
    },
    /// Write a README in the workspace and commit it
    Scenario,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat { message: None }
        }
    });

    if let Commands::Onboard = command {
        let onboard_config = onboard::run_onboard().map_err(|e| {
            eprintln!("❌ Onboarding failed: {}", e);
            anyhow::anyhow!("Onboarding failed: {}", e)
        })?;
        return config::save_config(&onboard_config);
    }

    let config = Config::load_or_init()?;
    init_tracing(&config.log_level);

    let servers_file = config.servers_file();
    let servers = config::load_servers(&servers_file)?;
    let logger = Arc::new(
        InteractionLogger::open(&config.log_path)
            .with_context(|| format!("Could not open log at {}", config.log_path.display()))?,
    );
    info!(servers = servers.len(), file = %servers_file.display(), "Starting tool client manager");

    let manager = Arc::new(
        ToolClientManager::start(ManagerOptions::from_config(&config, servers), logger).await,
    );

    let result = tokio::select! {
        result = run_command(command, &config, manager.clone()) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            Ok(())
        }
    };

    manager.close().await;
    result
}

async fn run_command(
    command: Commands,
    config: &Config,
    manager: Arc<ToolClientManager>,
) -> Result<()> {
    let build_agent = || {
        create_chat(config)
            .map(|chat| AgentLoop::new(chat, manager.clone()).with_max_steps(config.max_steps))
    };

    match command {
        Commands::Onboard => {}
        Commands::Chat { message: Some(msg) } => {
            let mut agent = build_agent()?;
            println!("\n🤔 Processing...");
            let outcome = agent.run(&msg).await?;
            render::print_outcome(&outcome);
        }
        Commands::Chat { message: None } => {
            let history_path = config::get_mcphost_dir().join("history.txt");
            repl::Repl::new(manager.clone(), history_path)
                .with_agent(build_agent())
                .run()
                .await?;
        }
        Commands::Tools { server } => {
            render::print_tools(&manager.list_tools(server.as_deref()).await);
        }
        Commands::Schema { server, tool } => {
            let descriptor = manager.get_schema(&server, &tool).await?;
            render::print_schema(&server, &descriptor);
        }
        Commands::Call { server, tool, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("Arguments must be valid JSON")?;
            let result = manager.call_tool(&server, &tool, args).await?;
            render::print_json(&result);
        }
        Commands::Scenario => {
            let steps = manager.run_scenario().await?;
            render::print_steps(&steps);
        }
    }

    Ok(())
}
