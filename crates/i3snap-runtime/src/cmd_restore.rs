//! `i3-snapshot restore`: replay a stored snapshot.

use i3snap_engine::{ProcessLauncher, Restorer};

use crate::cli::RestoreOpts;
use crate::context::Context;

pub async fn cmd_restore(ctx: &Context, opts: &RestoreOpts) -> anyhow::Result<()> {
    let snapshot = ctx.store()?.load(&opts.name)?;
    let client = ctx.i3_client()?;

    let report = Restorer::new(&client, &client, ProcessLauncher)
        .with_rules(ctx.rules.clone())
        .with_timing(opts.timing())
        .restore(&snapshot)
        .await;

    for workspace in &report.workspaces {
        eprintln!("{workspace}");
    }
    if report.has_failures() {
        anyhow::bail!("snapshot {:?} was only partially restored", report.snapshot);
    }
    Ok(())
}
