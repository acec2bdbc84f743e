use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use speckit_agent::AgentRegistry;
use speckit_engine::CommandExecutor;
use speckit_registry::{CommandDiscovery, CommandRegistry};
use speckit_types::ExecutionContext;
use tracing::debug;

mod builtins;

#[derive(Parser)]
#[command(name = "speckit", version, about = "Command and agent dispatch for spec-driven workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one command line, e.g. `speckit run '/spec "add login" --template=default'`
    Run {
        input: String,
        /// Project directory recorded in the execution context
        #[arg(long)]
        project: Option<String>,
        /// Print the full result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered commands
    List {
        #[arg(long)]
        category: Option<String>,
        /// Include hidden and disabled commands
        #[arg(long)]
        all: bool,
    },
    /// Search commands by name, description, or tag
    Search { query: String },
    /// Show detailed help for one command
    Describe { command: String },
    /// Show registry statistics
    Stats,
    /// List or search agents
    Agents {
        #[arg(long)]
        query: Option<String>,
    },
    /// Operate on a single agent
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// Send a JSON input document to an agent
    Run {
        name: String,
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Show status for one agent, or all agents when omitted
    Status { name: Option<String> },
    /// Rebuild an agent instance from its factory
    Reload { name: String },
    /// Show capability labels per agent
    Capabilities,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let registry = Arc::new(Mutex::new(CommandRegistry::new()));
    let mut discovery = CommandDiscovery::new();
    discovery.add_namespace("builtin", builtins::command_candidates());
    {
        let mut guard = registry.lock().expect("registry lock");
        let report = discovery.discover_and_register("builtin", &mut guard);
        debug!(registered = report.registered_count, "commands registered");
    }

    let mut agents = AgentRegistry::new();
    agents.initialize(builtins::agent_candidates());

    let executor = CommandExecutor::new(Arc::clone(&registry));

    match cli.command {
        Commands::Run { input, project, json } => {
            let context = match project {
                Some(path) => ExecutionContext::for_session(Some(&path), None, None),
                None => ExecutionContext::new(),
            };
            let result = executor.run(&input, &context);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", CommandExecutor::format_result(&result));
            }
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::List { category, all } => {
            let guard = registry.lock().expect("registry lock");
            for entry in guard.list_commands(category.as_deref(), all, all) {
                print_command_line(entry);
            }
        }
        Commands::Search { query } => {
            let guard = registry.lock().expect("registry lock");
            for entry in guard.search_commands(&query, None, false) {
                print_command_line(entry);
            }
        }
        Commands::Describe { command } => {
            let guard = registry.lock().expect("registry lock");
            let help = guard
                .command_help(&command)
                .with_context(|| format!("command '{command}' not found"))?;
            println!("{}", serde_json::to_string_pretty(&help)?);
        }
        Commands::Stats => {
            let guard = registry.lock().expect("registry lock");
            println!("{}", serde_json::to_string_pretty(&guard.stats())?);
        }
        Commands::Agents { query } => {
            let entries = match query {
                Some(query) => agents.search_agents(&query),
                None => agents.list_agents(),
            };
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Agent { command } => run_agent_command(&mut agents, command)?,
    }

    Ok(())
}

fn run_agent_command(agents: &mut AgentRegistry, command: AgentCommands) -> Result<()> {
    match command {
        AgentCommands::Run { name, input } => {
            let input: Value = serde_json::from_str(&input).context("agent input must be valid JSON")?;
            let outcome = agents.execute_agent(&name, &input);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                std::process::exit(1);
            }
        }
        AgentCommands::Status { name } => {
            let status = match name {
                Some(name) => agents.status(&name),
                None => Value::Array(agents.status_all()),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        AgentCommands::Reload { name } => {
            agents.reload(&name)?;
            println!("Agent '{name}' reloaded");
        }
        AgentCommands::Capabilities => {
            println!("{}", serde_json::to_string_pretty(&agents.capabilities_summary())?);
        }
    }
    Ok(())
}

fn print_command_line(entry: &speckit_registry::RegisteredCommand) {
    let meta = &entry.metadata;
    let aliases = if meta.aliases.is_empty() {
        String::new()
    } else {
        format!(" (aliases: {})", meta.aliases.join(", "))
    };
    println!("{:<12} [{}] {}{}", meta.name, meta.category, meta.description, aliases);
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
