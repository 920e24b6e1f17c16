//! One-shot Tec assistant CLI
//!
//! Prints exactly one JSON line on stdout: `{"response": ...}` on success or
//! `{"error": ...}` with exit status 1. Logs go to stderr.

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use tec_assistant::{
    config::{AssistantConfig, RetrievalStrategy},
    image::ImageInput,
    knowledge::Corpus,
    providers::{build_embedder, CompletionProvider, OpenAiClient},
    retrieval::build_retriever,
    types::{ChatMessage, CliInput},
    Assistant,
};

#[derive(Parser)]
#[command(name = "tec-assistant", version, about = "Ask Tec, the Amman Arab University assistant")]
struct Cli {
    /// Message to answer
    message: Option<String>,

    /// Conversation history as a JSON array of {role, content} messages
    history: Option<String>,

    /// Read {"message", "conversationHistory", "imageUrl"} from stdin
    #[arg(long)]
    stdin: bool,

    /// Only run knowledge retrieval, without calling the chat model
    #[arg(long)]
    search_only: bool,

    /// Config file (defaults to ~/.config/tec-assistant/config.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,
}

/// Everything needed for one answer
struct Request {
    message: String,
    history: Vec<ChatMessage>,
    image: Option<String>,
}

fn read_request(cli: &Cli) -> anyhow::Result<Request> {
    let request = if cli.stdin {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
        let input: CliInput = match serde_json::from_str(&raw) {
            Ok(input) => input,
            Err(_) => bail!("Invalid JSON input"),
        };
        Request {
            message: input.message.unwrap_or_default(),
            history: input.conversation_history.unwrap_or_default(),
            image: input.image_url,
        }
    } else {
        let history = cli
            .history
            .as_deref()
            .and_then(|raw| match serde_json::from_str::<Vec<ChatMessage>>(raw) {
                Ok(history) => Some(history),
                Err(e) => {
                    tracing::debug!("Ignoring invalid history argument: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        Request {
            message: cli.message.clone().unwrap_or_default(),
            history,
            image: None,
        }
    };

    if request.message.trim().is_empty() {
        bail!("No message provided");
    }
    Ok(request)
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let request = read_request(&cli)?;
    let config = AssistantConfig::resolve(cli.config.as_deref())?;

    let corpus = Arc::new(Corpus::load(config.knowledge.path.as_deref())?);
    let embedder = match config.retrieval.strategy {
        RetrievalStrategy::Semantic => Some(build_embedder(&config.embeddings)?),
        RetrievalStrategy::Keyword => None,
    };
    let retriever = build_retriever(&config.retrieval, corpus, embedder).await?;

    if cli.search_only {
        return Ok(retriever.retrieve(&request.message).await?);
    }

    let image = request
        .image
        .as_deref()
        .filter(|data| !data.trim().is_empty())
        .map(ImageInput::parse)
        .transpose()?;

    let llm: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(&config.llm)?);
    let assistant = Assistant::new(llm, retriever);
    let reply = assistant
        .reply(&request.history, &request.message, image.as_ref())
        .await?;

    Ok(reply.answer)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tec_assistant=info,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(response) => println!("{}", json!({ "response": response })),
        Err(e) => {
            println!("{}", json!({ "error": e.to_string() }));
            std::process::exit(1);
        }
    }
}
