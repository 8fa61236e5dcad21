use std::path::Path;

use quire_core::RealtimeMessage;
use tokio::sync::mpsc;

use crate::commands::common::Context;
use crate::error::CliError;

/// Decode a recorded feed, one JSON payload per line. Blank lines are skipped;
/// undecodable lines are counted and logged.
pub fn decode_feed(raw: &str) -> (Vec<RealtimeMessage>, usize) {
    let mut messages = Vec::new();
    let mut dropped = 0;
    for (number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let decoded = serde_json::from_str::<serde_json::Value>(line)
            .map_err(|error| error.to_string())
            .and_then(|payload| {
                RealtimeMessage::decode(&payload).map_err(|error| error.to_string())
            });
        match decoded {
            Ok(message) => messages.push(message),
            Err(error) => {
                tracing::warn!("Skipping feed line {}: {}", number + 1, error);
                dropped += 1;
            }
        }
    }
    (messages, dropped)
}

pub async fn run_replay(ctx: &mut Context, path: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(path)?;
    let (messages, dropped) = decode_feed(&raw);
    let applied = messages.len();

    let (sender, receiver) = mpsc::channel(applied.max(1));
    for message in messages {
        if sender.send(message).await.is_err() {
            break;
        }
    }
    drop(sender);
    ctx.engine.run(&mut ctx.session, receiver).await;
    ctx.report_events();

    println!("Applied {applied} change(s), skipped {dropped}");
    Ok(())
}
