//! Tool Agent - command-line entry point.
//!
//! Runs a single request or an interactive chat against the configured backend.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tool_agent::agent::{Agent, AgentBuilder, ToolLinePairing};
use tool_agent::{config::Config, llm, tools};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "tool-agent", version, about = "Tool-augmented chat agent")]
struct Cli {
    /// YAML config file (overrides AGENT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat with the agent
    Chat {
        /// Ask a single question and exit
        #[arg(short, long)]
        content: Option<String>,
    },
    /// List the available tools
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tool_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    info!(
        "Loaded configuration: provider={:?} model={} max_steps={}",
        config.llm.provider, config.llm.model, config.max_steps
    );

    match cli.command {
        Command::Tools => {
            let registry =
                tools::ToolRegistry::from_providers(&tools::builtin_providers(&config.workspace_path));
            println!("{}", registry.render_catalog());
        }
        Command::Chat { content } => {
            let mut agent = make_agent(&config)?;
            match content {
                Some(content) => println!("{}", agent.chat(&content).await?),
                None => chat_loop(&mut agent).await?,
            }
        }
    }

    Ok(())
}

fn make_agent(config: &Config) -> anyhow::Result<Agent> {
    let backend = llm::build_client(&config.llm)?;
    let pairing = if config.strict_tool_pairing {
        ToolLinePairing::SameBlock
    } else {
        ToolLinePairing::LastLineWinsPerField
    };

    Ok(AgentBuilder::new(backend)
        .providers(tools::builtin_providers(&config.workspace_path))
        .memory_capacity(config.memory_capacity)
        .max_steps(config.max_steps)
        .pairing(pairing)
        .build())
}

async fn chat_loop(agent: &mut Agent) -> anyhow::Result<()> {
    println!("==== Tool Agent ====");
    println!("Ask a question ('exit' to quit):");

    let stdin = std::io::stdin();
    loop {
        print!("\n? ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nBye!");
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            println!("Bye!");
            break;
        }

        match agent.chat(question).await {
            Ok(reply) => {
                println!("\n--- answer ---");
                println!("{}", reply);
            }
            Err(e) => eprintln!("error: {}", e),
        }
    }

    Ok(())
}
