use std::{error::Error, path::PathBuf, sync::Arc};

use ai_llm_service::{LlmServiceProfiles, RetryPolicy, config_embedding_from_env, telemetry};
use api::{AppState, EngineParts};
use clap::{Parser, Subcommand};
use contextor::{AskOptions, Contextor, ContextorConfig, IndicatifProgress};
use rag_store::{RagConfig, RagStore, ServiceEmbedder, index_corpus};
use session_store::SessionStore;
use tracing::{error, info};

/// HUS admissions FAQ chatbot.
#[derive(Debug, Parser)]
#[command(name = "hus-chatbot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Embed every FAQ question and write the index.
    Index {
        /// CSV with `question` and `answer` columns.
        #[arg(long, env = "FAQ_CSV", default_value = "faq.csv")]
        csv: PathBuf,
        /// Output directory for `faq_index.json`.
        #[arg(long, env = "INDEX_DIR", default_value = "faiss_index")]
        index_dir: PathBuf,
    },
    /// Answer one question and print it.
    Ask {
        question: String,
        /// Nearest FAQ entries to fetch.
        #[arg(long)]
        top_k: Option<usize>,
        /// How many of them go into the prompt.
        #[arg(long)]
        context_k: Option<usize>,
        /// Also print the FAQ entries used as references.
        #[arg(long)]
        show_references: bool,
    },
    /// Serve the web chat.
    Serve {
        #[arg(long, env = "API_ADDRESS", default_value = "127.0.0.1:8501")]
        addr: String,
        /// Directory for per-session chat history.
        #[arg(long, env = "CACHE_DIR", default_value = "cache")]
        cache_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // `.env` is optional; a malformed one is an error.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    telemetry::init("info");

    let cli = Cli::parse();
    let res = match cli.command {
        Command::Index { csv, index_dir } => run_index(csv, index_dir).await,
        Command::Ask {
            question,
            top_k,
            context_k,
            show_references,
        } => {
            let opts = AskOptions {
                top_k: top_k.unwrap_or(0),
                context_k: context_k.unwrap_or(0),
            };
            run_ask(&question, opts, show_references).await
        }
        Command::Serve { addr, cache_dir } => run_serve(&addr, cache_dir).await,
    };

    if let Err(e) = &res {
        error!(error = %e, "command failed");
    }
    res
}

async fn run_index(csv: PathBuf, index_dir: PathBuf) -> Result<(), Box<dyn Error>> {
    // Indexing needs only the embedding profile.
    let embedding = config_embedding_from_env()?;
    let svc = Arc::new(LlmServiceProfiles::new(
        embedding.clone(),
        embedding,
        RetryPolicy::default(),
        Some(10),
    )?);

    let mut cfg = RagConfig::from_env()?;
    cfg.index_dir = index_dir;
    let embedder = ServiceEmbedder::new(svc, cfg.embedding_dim);

    let (path, entries) = index_corpus(&csv, &embedder, &cfg, true).await?;
    info!(path = %path.display(), entries, "index ready");
    Ok(())
}

async fn run_ask(
    question: &str,
    opts: AskOptions,
    show_references: bool,
) -> Result<(), Box<dyn Error>> {
    let svc = Arc::new(LlmServiceProfiles::from_env()?);
    let cfg = RagConfig::from_env()?;
    let store = RagStore::open(cfg.clone())?;
    let embedder = Arc::new(ServiceEmbedder::new(svc.clone(), cfg.embedding_dim));
    let ctx = Contextor::new(Arc::new(store), embedder, svc, ContextorConfig::from_env());

    let qa = ctx
        .ask_with_progress(question, opts, &IndicatifProgress::spinner())
        .await?;

    println!("{}", qa.answer);
    if show_references {
        for (i, r) in qa.references.iter().enumerate() {
            println!(
                "\n[{}] ({:.3}) {}\n    {}",
                i + 1,
                r.score,
                r.source_question,
                r.answer
            );
        }
    }
    Ok(())
}

async fn run_serve(addr: &str, cache_dir: PathBuf) -> Result<(), Box<dyn Error>> {
    let svc = Arc::new(LlmServiceProfiles::from_env()?);
    let cfg = RagConfig::from_env()?;
    let parts = EngineParts {
        embedder: Arc::new(ServiceEmbedder::new(svc.clone(), cfg.embedding_dim)),
        generator: svc.clone(),
        contextor: ContextorConfig::from_env(),
        rag: cfg,
    };
    let sessions = SessionStore::new(cache_dir)?;
    let state = Arc::new(AppState::new(sessions, parts, Some(svc)));

    api::start(state, addr).await?;
    Ok(())
}
