//! vscope: a trailing-window view of a high-rate 3-axis vector stream.
//!
//! Run with:  `RUST_LOG=info vscope [CONFIG]`
//!
//! Console commands: `t` toggle ingest, `r` reset, `s` status, `q` quit.

mod console;

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("vscope v{} starting", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(vscope_config::default_path);
    let config = vscope_config::load(&path)?;

    // Both periodic tasks share one thread; ticks interleave, never overlap.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(console::run(path, config))
}
