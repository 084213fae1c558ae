//! chat: interactive terminal session with a tool-wielding agent.
//!
//! Connects the configured tool servers, prints the merged catalog and
//! then loops on stdin. Each line is one agent turn; tool calls happen
//! behind the scenes and only the final answer is printed.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wield::{
    Agent, AgentError, ChatClient, ModelOptions, ServerConfig, SessionConfig, SessionLimits,
    ToolRegistry,
};

#[derive(Parser, Debug)]
#[command(
    name = "chat",
    version,
    about = "Terminal chat with an agent that can call MCP tools"
)]
struct Args {
    /// Tool servers to connect, as NAME=URL pairs. Defaults to the local
    /// helper-tools server.
    #[arg(short, long = "server", value_name = "NAME=URL")]
    servers: Vec<String>,

    /// Model to ask for.
    #[arg(short, long, default_value = "gpt-4o-mini")]
    model: String,

    /// Maximum model rounds per user turn.
    #[arg(long, default_value_t = 10)]
    max_rounds: usize,

    /// Per-server connect and discovery timeout in seconds.
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Per-tool-call timeout in seconds.
    #[arg(long, default_value_t = 30)]
    call_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let servers = if args.servers.is_empty() {
        vec![ServerConfig::new("helper-tools", "http://127.0.0.1:3456/mcp")]
    } else {
        let mut servers = Vec::with_capacity(args.servers.len());
        for spec in &args.servers {
            servers.push(parse_server(spec)?);
        }
        servers
    };

    let limits = SessionLimits::default()
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_call_timeout(Duration::from_secs(args.call_timeout))
        .with_max_rounds(args.max_rounds);
    let config = SessionConfig::new(servers).with_limits(limits);

    let client = model_client(&args.model)?;
    let registry = ToolRegistry::start_session(config).await?;

    println!("Connected. Available tools:");
    for tool in registry.catalog() {
        println!("  {} [{}]: {}", tool.name, tool.server, tool.description);
    }
    println!("Type a message, or 'exit' to quit.\n");

    let mut agent = Agent::new(client, registry);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        match agent.submit(input).await {
            Ok(result) => {
                println!("agent> {}\n", result.output);
            }
            Err(AgentError::ToolLoopExceeded { rounds }) => {
                eprintln!("turn abandoned after {} rounds, try rephrasing\n", rounds);
            }
            Err(e) => {
                eprintln!("error: {}\n", e);
            }
        }
    }

    agent.end_session().await;
    println!("Bye.");

    Ok(())
}

fn parse_server(spec: &str) -> Result<ServerConfig, String> {
    match spec.split_once('=') {
        Some((name, url)) if !name.is_empty() && !url.is_empty() => {
            Ok(ServerConfig::new(name, url))
        }
        _ => Err(format!("invalid server spec '{}', expected NAME=URL", spec)),
    }
}

/// Pick the model backend from the environment: the Azure trio wins when
/// fully present, otherwise a plain OpenAI key.
fn model_client(model: &str) -> Result<ChatClient, String> {
    let options = ModelOptions::new(model).with_system(
        "You are a helpful assistant with access to tools. \
         Use them whenever they help answer the user.",
    );

    let azure = (
        std::env::var("AZURE_OPENAI_ENDPOINT"),
        std::env::var("AZURE_OPENAI_API_KEY"),
        std::env::var("AZURE_OPENAI_DEPLOYMENT"),
    );
    match azure {
        (Ok(endpoint), Ok(api_key), Ok(deployment)) => {
            let client = ChatClient::azure(endpoint, api_key, deployment, options);
            match std::env::var("AZURE_OPENAI_API_VERSION") {
                Ok(version) => Ok(client.with_api_version(version)),
                Err(_) => Ok(client),
            }
        }
        _ => match std::env::var("OPENAI_API_KEY") {
            Ok(api_key) => Ok(ChatClient::openai(api_key, options)),
            Err(_) => Err(concat!(
                "no model credentials: set OPENAI_API_KEY, or AZURE_OPENAI_ENDPOINT, ",
                "AZURE_OPENAI_API_KEY and AZURE_OPENAI_DEPLOYMENT"
            )
            .to_string()),
        },
    }
}
