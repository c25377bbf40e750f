#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, HistoryInput, HistoryStrategy, InfoStrategy,
    InitStrategy, RagAction, RagStrategy, VersionStrategy,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "kefu")]
#[command(about = "Retrieval-augmented customer-service assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (interactive unless --message is given)
    Chat {
        /// Single raw message to send, may carry `user_id:` / `platform:` markers
        #[arg(short = 'm', long)]
        message: Option<String>,

        /// Model to use
        #[arg(short = 'M', long)]
        model: Option<String>,
    },
    /// Show the recent history window for a user
    History {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        platform: String,

        /// Maximum number of exchanges
        #[arg(short, long)]
        count: Option<usize>,

        /// Maximum approximate tokens
        #[arg(short, long)]
        tokens: Option<usize>,
    },
    /// Talk to the RAGFlow backend directly
    Rag {
        #[command(subcommand)]
        action: RagAction,
    },
    /// Initialize configuration
    Init,
    /// Show configuration
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { message, model } => {
            ChatStrategy.execute(ChatInput { message, model }).await?;
        }
        Commands::History {
            user,
            platform,
            count,
            tokens,
        } => {
            HistoryStrategy
                .execute(HistoryInput {
                    user_id: user,
                    platform,
                    max_count: count,
                    max_tokens: tokens,
                })
                .await?;
        }
        Commands::Rag { action } => {
            RagStrategy.execute(action).await?;
        }
        Commands::Init => {
            InitStrategy.execute(()).await?;
        }
        Commands::Info => {
            InfoStrategy.execute(()).await?;
        }
        Commands::Version => {
            VersionStrategy.execute(()).await?;
        }
    }

    Ok(())
}
