use quire_core::ReconcileOutcome;

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_sync(ctx: &mut Context, offline: bool) -> Result<(), CliError> {
    if offline {
        return Err(CliError::SyncNotConfigured);
    }

    match ctx.engine.reconcile(&mut ctx.session).await? {
        ReconcileOutcome::Completed {
            notes,
            pushed,
            push_failures,
            first_run,
        } => {
            if first_run {
                println!("Adopted {notes} note(s) from the remote copy");
            } else {
                println!("Synced {notes} note(s), pushed {pushed}");
            }
            if push_failures > 0 {
                eprintln!("{push_failures} note(s) failed to upload");
            }
        }
        ReconcileOutcome::Aborted { reason } => {
            eprintln!("Sync aborted, local notes left untouched: {reason}");
        }
    }

    ctx.engine.aggregate_shared(&mut ctx.session).await?;
    ctx.engine.load_todos(&mut ctx.session).await?;
    ctx.report_events();
    Ok(())
}
