//! Quire CLI - local-first notes from the terminal
//!
//! Every command opens the local store, works on it, and pushes the change when
//! a remote is configured.

mod backend;
mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use quire_core::Config;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::Context;
use crate::commands::{notes, replay, shared, sync, todo};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "quire_core=info,quire_cli=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        // Quick capture mode: quire "my thought"
        if cli.note.is_empty() {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        let mut ctx = Context::open(&config, cli.db_path).await?;
        notes::run_new(&mut ctx, None, &cli.note).await?;
        return ctx.finish().await;
    };

    let mut ctx = Context::open(&config, cli.db_path).await?;
    let offline = ctx.engine.remote().is_offline();

    match command {
        Commands::New { list, content } => {
            notes::run_new(&mut ctx, list.as_deref(), &content).await?;
        }
        Commands::List {
            list,
            deleted,
            limit,
            json,
        } => notes::run_list(&ctx, list.as_deref(), deleted, limit, json)?,
        Commands::Lists => notes::run_lists(&ctx),
        Commands::Edit { id, content } => notes::run_edit(&mut ctx, &id, &content).await?,
        Commands::Pin { id, off } => notes::run_pin(&mut ctx, &id, !off).await?,
        Commands::Move { id, list } => notes::run_move(&mut ctx, &id, &list).await?,
        Commands::RenameList { old, new } => notes::run_rename_list(&mut ctx, &old, &new).await?,
        Commands::Delete { id } => notes::run_delete(&mut ctx, &id).await?,
        Commands::Restore { id } => notes::run_restore(&mut ctx, &id).await?,
        Commands::Purge { id } => notes::run_purge(&mut ctx, &id).await?,
        Commands::Sync => sync::run_sync(&mut ctx, offline).await?,
        Commands::Shared { json } => shared::run_shared(&mut ctx, json).await?,
        Commands::Share { id, recipient } => shared::run_share(&mut ctx, &id, &recipient).await?,
        Commands::Unshare { id, recipient } => {
            shared::run_unshare(&mut ctx, &id, &recipient).await?;
        }
        Commands::Todo { command } => todo::run_todo(&mut ctx, command, offline).await?,
        Commands::Replay { path } => replay::run_replay(&mut ctx, &path).await?,
    }

    ctx.finish().await
}
