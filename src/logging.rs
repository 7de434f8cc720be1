use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise only warnings are shown, or debug
/// output for this crate with `verbose`. Output goes through the stderr
/// buffer so the TUI can hold it back while it owns the terminal.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "battle_judge=debug"
    } else {
        "battle_judge=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(crate::stderr_buffer::writer)
        .try_init();
}
