//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no I/O happens here. [`Cli::apply`] folds the
//! command-line overrides into a loaded [`SinkConfig`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use loglet_core::config::{CallerMode, SinkConfig};
use loglet_core::Format;

/// loglet -- pipe log lines through a level-aware formatter.
///
/// Each input line is scanned for a leading level token (`[ERROR]`, `WRN `, ...),
/// filtered by minimum level, decorated with a timestamp and optional color,
/// and written to stdout.
#[derive(Parser, Debug)]
#[command(name = "loglet", version, about, long_about = None)]
pub struct Cli {
    /// Path to a loglet.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long)]
    pub format: Option<FormatArg>,

    /// Minimum level to print (must appear in the configured level list).
    #[arg(short, long)]
    pub min_level: Option<String>,

    /// Disable ANSI colors.
    #[arg(long)]
    pub no_color: bool,

    /// Render timestamps in UTC.
    #[arg(long)]
    pub utc: bool,

    /// Append microseconds to the time field.
    #[arg(long)]
    pub micros: bool,

    /// Print the call site of each line.
    #[arg(long)]
    pub caller: Option<CallerArg>,

    /// Filter for loglet's own diagnostics (tracing env-filter syntax).
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Emit loglet's own diagnostics as JSON.
    #[arg(long)]
    pub log_json: bool,

    /// Input file (default: stdin).
    pub input: Option<PathBuf>,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable line.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Call-site argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CallerArg {
    /// File name only.
    Short,
    /// Full path.
    Long,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut SinkConfig) {
        if let Some(format) = self.format {
            config.format = match format {
                FormatArg::Pretty => Format::Pretty,
                FormatArg::Json => Format::Json,
            };
        }
        if let Some(min_level) = &self.min_level {
            config.min_level = min_level.clone();
        }
        if self.no_color {
            config.color = false;
        }
        if self.utc {
            config.time.utc = true;
        }
        if self.micros {
            config.time.microseconds = true;
            config.time.time = true;
        }
        if let Some(caller) = self.caller {
            config.caller = match caller {
                CallerArg::Short => CallerMode::Short,
                CallerArg::Long => CallerMode::Long,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let cli = Cli::try_parse_from(["loglet"]).unwrap();
        let mut config = SinkConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.format, Format::Pretty);
        assert_eq!(config.min_level, "DEBUG");
        assert!(config.color);
        assert!(cli.input.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cli = Cli::try_parse_from([
            "loglet",
            "--format",
            "json",
            "--min-level",
            "WARN",
            "--no-color",
            "--utc",
            "--micros",
            "--caller",
            "short",
            "app.log",
        ])
        .unwrap();
        let mut config = SinkConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.format, Format::Json);
        assert_eq!(config.min_level, "WARN");
        assert!(!config.color);
        assert!(config.time.utc);
        assert!(config.time.microseconds);
        assert_eq!(config.caller, CallerMode::Short);
        assert_eq!(cli.input, Some(PathBuf::from("app.log")));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["loglet", "--format", "xml"]).is_err());
    }
}
