//! `i3-snapshot save`: capture the live layout and store it.

use i3snap_engine::{CaptureScope, Capturer};
use i3snap_sys::{ProcFs, X11OwnerResolver};

use crate::cli::SaveOpts;
use crate::context::Context;

pub fn cmd_save(ctx: &Context, opts: &SaveOpts) -> anyhow::Result<()> {
    let store = ctx.store()?;
    // Reject a bad name before touching i3 or X11.
    store.path_of(&opts.name)?;

    let client = ctx.i3_client()?;
    let scope = if opts.focused {
        CaptureScope::Focused
    } else {
        CaptureScope::All
    };
    let snapshot = Capturer::new(&client, X11OwnerResolver::new(), ProcFs::default())
        .with_rules(ctx.rules.clone())
        .capture(&opts.name, scope)?;

    let unlaunchable = snapshot
        .workspaces
        .iter()
        .flat_map(|ws| ws.windows.iter())
        .filter(|w| !w.is_launchable())
        .count();
    let path = store.save(&snapshot, opts.force)?;

    println!(
        "saved {:?}: {} workspace(s), {} window(s) to {}",
        snapshot.name,
        snapshot.workspaces.len(),
        snapshot.window_count(),
        path.display()
    );
    if unlaunchable > 0 {
        eprintln!("{unlaunchable} window(s) have no recorded command and will not be relaunched");
    }
    Ok(())
}
