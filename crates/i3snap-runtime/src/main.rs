//! i3-snapshot: save and restore i3 layouts with their applications.

use clap::Parser;

mod cli;
mod cmd_list;
mod cmd_pid;
mod cmd_restore;
mod cmd_save;
mod cmd_tree;
mod context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("I3SNAP_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let ctx = context::Context::from_cli(&args);
    match &args.command {
        cli::Command::Save(opts) => cmd_save::cmd_save(&ctx, opts)?,
        cli::Command::Restore(opts) => cmd_restore::cmd_restore(&ctx, opts).await?,
        cli::Command::Tree => cmd_tree::cmd_tree(&ctx)?,
        cli::Command::Pid(opts) => cmd_pid::cmd_pid(opts.pid)?,
        cli::Command::List => cmd_list::cmd_list(&ctx)?,
        cli::Command::Version => {
            println!("i3-snapshot {}", env!("CARGO_PKG_VERSION"));
            // The window manager's version is informational only.
            match ctx.i3_client().and_then(|c| Ok(c.get_version()?)) {
                Ok(v) => println!("i3 {}", v.human_readable),
                Err(e) => tracing::debug!("i3 version unavailable: {e:#}"),
            }
        }
    }

    Ok(())
}
