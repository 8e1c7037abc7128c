//! Tracing subscriber initialization for the `cps` binary.
//!
//! # Priority (highest to lowest)
//!
//! 1. `CPS_LOG` env var (per-target directives, e.g. `cps=trace,warn`)
//! 2. `RUST_LOG` env var
//! 3. CLI flags (`-v` → debug, `-q` → error)
//! 4. Default level: `warn`

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Target every library event is emitted under.
const TARGET: &str = "cps";

/// Verbosity level derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet` / `-q`: only errors.
    Quiet,
    /// Default: warnings and above.
    Normal,
    /// `--verbose` / `-v`: every routing decision.
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Call once, before loading config, so config warnings are captured.
pub fn init(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .without_time()
        .compact();

    // `try_init` so a second call (tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity, env_directives()))
        .with(layer)
        .try_init();
}

fn env_directives() -> Option<String> {
    std::env::var("CPS_LOG")
        .ok()
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
}

/// Build the filter from env directives, falling back to the CLI level.
///
/// Unparseable directives fall through to the CLI level rather than failing.
fn build_env_filter(verbosity: Verbosity, directives: Option<String>) -> EnvFilter {
    if let Some(directives) = directives {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    let level = verbosity.default_level();
    let directive = match verbosity {
        Verbosity::Verbose => format!("{level},{TARGET}=debug"),
        Verbosity::Normal | Verbosity::Quiet => level.to_string(),
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
