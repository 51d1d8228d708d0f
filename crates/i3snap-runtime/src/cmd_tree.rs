//! `i3-snapshot tree`: dump the live tree as i3 reports it.

use crate::context::Context;

pub fn cmd_tree(ctx: &Context) -> anyhow::Result<()> {
    let tree = ctx.i3_client()?.get_tree_json()?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
