use quire_core::{SaveOutcome, DEFAULT_LIST};

use crate::commands::common::{
    capture_editor_input_with_initial, format_note_lines, normalize_content, note_to_list_item,
    resolve_note, resolve_note_content, Context, NoteListItem,
};
use crate::error::CliError;

pub async fn run_new(
    ctx: &mut Context,
    list: Option<&str>,
    content_parts: &[String],
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;
    let list = list.unwrap_or(DEFAULT_LIST);

    let draft = ctx.engine.create_note(&mut ctx.session, list).await?;
    let outcome = ctx.engine.save(&mut ctx.session, &draft.id, &content).await?;
    report_save(&outcome);

    println!("{}", draft.id);
    Ok(())
}

pub fn run_list(
    ctx: &Context,
    list: Option<&str>,
    deleted: bool,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let notes = ctx.session.notes();
    let mut shown = match (deleted, list) {
        (true, _) => notes.recently_deleted(),
        (false, Some(list)) => notes.in_list(list),
        (false, None) => notes
            .sorted()
            .into_iter()
            .filter(|note| !note.deleted)
            .collect(),
    };
    shown.truncate(limit);

    if as_json {
        let items = shown
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for line in format_note_lines(&shown) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_lists(ctx: &Context) {
    let notes = ctx.session.notes();
    for list in notes.lists() {
        let count = notes
            .iter()
            .filter(|note| !note.deleted && note.list == list)
            .count();
        println!("{list}  ({count})");
    }
}

pub async fn run_edit(ctx: &mut Context, id: &str, content_parts: &[String]) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;

    let edited = match normalize_content(&content_parts.join(" ")) {
        Some(content) => content,
        None => capture_editor_input_with_initial(&note.content)?.unwrap_or_default(),
    };
    if edited == note.content {
        println!("{}", note.id);
        return Ok(());
    }

    ctx.engine.open_note(&mut ctx.session, note.id).await?;
    let outcome = ctx.engine.save(&mut ctx.session, &note.id, &edited).await?;
    ctx.engine.leave_note(&mut ctx.session).await?;
    report_save(&outcome);

    println!("{}", note.id);
    Ok(())
}

pub async fn run_pin(ctx: &mut Context, id: &str, pinned: bool) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    let note = ctx.engine.set_pinned(&mut ctx.session, &note.id, pinned).await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_move(ctx: &mut Context, id: &str, list: &str) -> Result<(), CliError> {
    let list = normalize_content(list).unwrap_or_else(|| DEFAULT_LIST.to_string());
    let note = resolve_note(ctx.session.notes(), id)?;
    let note = ctx.engine.move_list(&mut ctx.session, &note.id, &list).await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_rename_list(ctx: &mut Context, old: &str, new: &str) -> Result<(), CliError> {
    let Some(new) = normalize_content(new) else {
        return Err(CliError::Core(quire_core::Error::InvalidInput(
            "folder name cannot be empty".to_string(),
        )));
    };
    let moved = ctx.engine.rename_list(&mut ctx.session, old, &new).await?;
    println!("Moved {moved} note(s) to {new}");
    Ok(())
}

pub async fn run_delete(ctx: &mut Context, id: &str) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    ctx.engine.soft_delete(&mut ctx.session, &note.id).await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_restore(ctx: &mut Context, id: &str) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    ctx.engine.restore(&mut ctx.session, &note.id).await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_purge(ctx: &mut Context, id: &str) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    ctx.engine.purge(&mut ctx.session, &note.id).await?;
    ctx.report_events();
    println!("{}", note.id);
    Ok(())
}

fn report_save(outcome: &SaveOutcome) {
    if let SaveOutcome::PushFailed(note) = outcome {
        eprintln!("Saved {} locally; the remote push failed", note.id);
    }
}
