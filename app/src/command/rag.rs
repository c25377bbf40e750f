//! Direct access to the RAGFlow backend, outside of any conversation.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use kefu_config::Config;
use kefu_core::RetrievalService;
use serde_json::Value;

use super::build_retrieval;

#[derive(Debug, Clone, Subcommand)]
pub enum RagAction {
    /// Open a retrieval session and print its id
    Session {
        #[arg(short, long)]
        user: String,
    },
    /// Ask a question inside an existing session
    Ask {
        #[arg(short, long)]
        session: String,
        question: String,
    },
    /// Show the messages of a RAGFlow conversation
    Conversation { id: String },
    /// Show document metadata
    Document { id: String },
    /// Upload a document described by a JSON file
    Upload { path: PathBuf },
    /// List the chunks of a document
    Chunks { document_id: String },
    /// List the documents of a knowledge base
    Docs { knowledge_base_id: String },
    /// Delete a document
    Delete { document_id: String },
}

/// Strategy for the auxiliary `rag` subcommands.
#[derive(Debug, Clone, Copy)]
pub struct RagStrategy;

impl super::CommandStrategy for RagStrategy {
    type Input = RagAction;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let client = build_retrieval(&config)?;

        let body = match input {
            RagAction::Session { user } => {
                let session_id = client.create_session(&user).await?;
                println!("{session_id}");
                return Ok(());
            }
            RagAction::Ask { session, question } => {
                match client.query(&session, &question).await? {
                    Some(answer) => println!("{answer}"),
                    None => println!("(no parsable answer)"),
                }
                return Ok(());
            }
            RagAction::Conversation { id } => client.conversation_history(&id).await?,
            RagAction::Document { id } => client.get_document(&id).await?,
            RagAction::Upload { path } => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let document: Value = serde_json::from_str(&content)
                    .with_context(|| format!("{} is not valid JSON", path.display()))?;
                client.upload_document(&document).await?
            }
            RagAction::Chunks { document_id } => client.list_chunks(&document_id).await?,
            RagAction::Docs { knowledge_base_id } => {
                client.list_kb_docs(&knowledge_base_id).await?
            }
            RagAction::Delete { document_id } => client.delete_document(&document_id).await?,
        };

        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    }
}
