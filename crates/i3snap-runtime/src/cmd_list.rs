//! `i3-snapshot list`: stored snapshot names, one per line.

use crate::context::Context;

pub fn cmd_list(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let names = store.list()?;
    if names.is_empty() {
        eprintln!("no snapshots in {}", store.dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}
