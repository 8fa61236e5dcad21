use chrono::{Local, NaiveDate};
use quire_core::models::{TodoItem, TodoList};

use crate::cli::TodoCommands;
use crate::commands::common::{normalize_content, short_id, Context};
use crate::error::CliError;

pub async fn run_todo(
    ctx: &mut Context,
    command: Option<TodoCommands>,
    offline: bool,
) -> Result<(), CliError> {
    if offline {
        return Err(CliError::SyncNotConfigured);
    }

    let today = Local::now().date_naive();
    ctx.engine.load_todos(&mut ctx.session).await?;
    ctx.engine.roll_over_todos(&mut ctx.session, today).await?;

    match command.unwrap_or(TodoCommands::List) {
        TodoCommands::List => {}
        TodoCommands::Add { text } => {
            let Some(text) = normalize_content(&text.join(" ")) else {
                return Err(CliError::EmptyContent);
            };
            let mut list = ctx.session.todo().list.clone();
            list.items.push(TodoItem {
                id: uuid::Uuid::now_v7().to_string(),
                text,
                done: false,
                day: today,
            });
            push(ctx, list).await?;
        }
        TodoCommands::Done { id } => {
            let mut list = ctx.session.todo().list.clone();
            let index = resolve_item(&list, &id)?;
            list.items[index].done = true;
            push(ctx, list).await?;
        }
    }

    for line in format_todo_lines(&ctx.session.todo().list, today) {
        println!("{line}");
    }
    Ok(())
}

async fn push(ctx: &mut Context, list: TodoList) -> Result<(), CliError> {
    if !ctx.engine.save_todos(&mut ctx.session, list).await? {
        eprintln!("The to-do list could not be uploaded");
    }
    Ok(())
}

/// Index of the item whose id starts with `query`
pub fn resolve_item(list: &TodoList, query: &str) -> Result<usize, CliError> {
    let query = query.trim();
    let matches: Vec<usize> = list
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| !query.is_empty() && item.id.starts_with(query))
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [index] => Ok(*index),
        [] => Err(CliError::TodoNotFound(query.to_string())),
        _ => Err(CliError::AmbiguousNoteId(format!(
            "ID prefix '{query}' matches {} to-do items",
            matches.len()
        ))),
    }
}

pub fn format_todo_lines(list: &TodoList, today: NaiveDate) -> Vec<String> {
    list.items
        .iter()
        .filter(|item| item.day == today)
        .map(|item| {
            let mark = if item.done { "x" } else { " " };
            format!("[{mark}] {:<13}  {}", short_id(&item.id), item.text)
        })
        .collect()
}
