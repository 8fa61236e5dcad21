use crate::commands::common::{note_preview, resolve_note, short_id, Context};
use crate::error::CliError;

pub async fn run_shared(ctx: &mut Context, as_json: bool) -> Result<(), CliError> {
    ctx.engine.aggregate_shared(&mut ctx.session).await?;
    ctx.report_events();

    let entries = ctx.session.shared_notes();
    if as_json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }

    for entry in entries {
        let preview = note_preview(&entry.note, 40);
        let id = short_id(&entry.note.id.to_string());
        if entry.is_own {
            let names = entry.shared_with_names.join(", ");
            println!("{id:<13}  {preview:<40}  shared with {names}");
        } else {
            println!("{id:<13}  {preview:<40}  from {}", entry.owner_display_name);
        }
    }
    Ok(())
}

pub async fn run_share(ctx: &mut Context, id: &str, recipient: &str) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    ctx.engine
        .share_note(&mut ctx.session, &note.id, recipient.trim())
        .await?;
    println!("{}", note.id);
    Ok(())
}

pub async fn run_unshare(ctx: &mut Context, id: &str, recipient: &str) -> Result<(), CliError> {
    let note = resolve_note(ctx.session.notes(), id)?;
    ctx.engine
        .unshare_note(&mut ctx.session, &note.id, recipient.trim())
        .await?;
    println!("{}", note.id);
    Ok(())
}
