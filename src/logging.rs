use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "contest_ics_lib=info,contest_ics=info";

/// Installs the global subscriber. Logs go to stderr so stdout stays free for
/// the calendar and the confirmation line.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("contest_ics_lib=debug,contest_ics=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
    };

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
