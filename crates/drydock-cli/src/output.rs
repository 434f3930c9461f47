use std::io::Write;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
///
/// Load warnings are printed by the commands themselves, so the quiet default
/// only lets errors through.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

fn colored_line(color: Color, label: &str, msg: &str) {
    let mut err = StandardStream::stderr(ColorChoice::Auto);
    let _ = err.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(err, "{label}");
    let _ = err.reset();
    let _ = writeln!(err, " {msg}");
}

/// One load warning, on stderr.
pub fn warning_line(msg: &str) {
    colored_line(Color::Yellow, "warning:", msg);
}

pub fn error_line(msg: &str) {
    let mut err = StandardStream::stderr(ColorChoice::Auto);
    let _ = err.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = writeln!(err, "{msg}");
    let _ = err.reset();
}

/// A fatal load failure: kind, user-facing explanation, detail.
pub fn failure_line(kind: &str, user_message: &str, detail: &str) {
    colored_line(Color::Red, &format!("{kind}:"), user_message);
    let _ = writeln!(std::io::stderr(), "  {detail}");
}
