// src/config.rs
use clap::Parser;
use log::warn;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TriviaError;
use crate::handlers::Features;
use crate::loader::LoadOptions;

#[derive(Debug, Clone, Parser)]
#[command(name = "trivia", version, about = "Serves a basic trivia web frontend.")]
pub struct Config {
    /// Address to bind to
    #[arg(short, long, env = "TRIVIA_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "TRIVIA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Number of HTTP worker threads
    #[arg(long, env = "NUM_WORKERS", default_value_t = 6)]
    pub workers: usize,

    /// File containing trivia questions (repeatable)
    #[arg(short = 'f', long = "question-file", env = "TRIVIA_QUESTION_FILES", value_delimiter = ',')]
    pub question_files: Vec<PathBuf>,

    /// Directory containing trivia question files (repeatable)
    #[arg(long = "question-path", env = "TRIVIA_QUESTION_PATHS", value_delimiter = ',')]
    pub question_paths: Vec<PathBuf>,

    /// Only process files ending in this extension (empty for all files)
    #[arg(long, env = "TRIVIA_EXTENSION", default_value = ".trivia")]
    pub extension: String,

    /// Recurse into subdirectories of --question-path
    #[arg(long, env = "TRIVIA_RECURSIVE")]
    pub recursive: bool,

    /// Allow live reload of questions via POST /reload
    #[arg(long, env = "TRIVIA_RELOAD")]
    pub reload: bool,

    /// Rebuild the question list on this interval (e.g. "5m" or "1h")
    #[arg(long, env = "TRIVIA_RELOAD_INTERVAL")]
    pub reload_interval: Option<String>,

    /// Rebuild the question list whenever the question files change
    #[arg(long, env = "TRIVIA_WATCH")]
    pub watch: bool,

    /// Allow exporting the question list via GET /export
    #[arg(long, env = "TRIVIA_EXPORT")]
    pub export: bool,

    /// Enable the settings page and preference cookies
    #[arg(long, env = "TRIVIA_SETTINGS")]
    pub settings: bool,

    /// Render question and answer text as HTML instead of escaping it
    #[arg(long, env = "TRIVIA_HTML")]
    pub html: bool,

    /// File of `category|color` lines used for footer colors
    #[arg(long, env = "TRIVIA_COLORS")]
    pub colors: Option<PathBuf>,

    /// Key used to sign cookies (random per process when unset)
    #[arg(long, env = "TRIVIA_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Mark cookies as Secure
    #[arg(long, env = "TRIVIA_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn bind_addr(&self) -> Result<IpAddr, TriviaError> {
        self.bind
            .parse()
            .map_err(|_| TriviaError::InvalidBind(self.bind.clone()))
    }

    pub fn reload_every(&self) -> Result<Option<Duration>, TriviaError> {
        self.reload_interval
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_interval)
            .transpose()
    }

    pub fn features(&self) -> Features {
        Features {
            reload: self.reload,
            export: self.export,
            settings: self.settings,
            trusted_markup: self.html,
        }
    }

    /// Normalises every supplied path. Paths that can't be resolved are
    /// logged and dropped; having none left is an error.
    pub fn load_options(&self) -> Result<LoadOptions, TriviaError> {
        let mut paths = Vec::new();
        for raw in self.question_files.iter().chain(&self.question_paths) {
            match normalize_path(raw) {
                Ok(path) => paths.push(path),
                Err(e) => warn!("{}", e),
            }
        }

        Ok(LoadOptions::new(paths)?
            .with_extension(&self.extension)
            .with_recursive(self.recursive))
    }
}

/// Expands `~`, resolves symlinks and makes the path absolute.
pub fn normalize_path(raw: &Path) -> Result<PathBuf, TriviaError> {
    let invalid = |source: std::io::Error| TriviaError::InvalidPath {
        path: raw.display().to_string(),
        source,
    };

    let expanded = match raw.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => raw.to_path_buf(),
        },
        Err(_) => raw.to_path_buf(),
    };

    expanded.canonicalize().map_err(invalid)
}

/// Longest accepted reload interval; deadlines past this risk `Instant` overflow.
pub const MAX_INTERVAL: Duration = Duration::from_secs(366 * 24 * 3600);

/// Accepts Go-style durations such as `90s`, `5m` or `1h30m`.
pub fn parse_interval(raw: &str) -> Result<Duration, TriviaError> {
    let invalid = || TriviaError::InvalidInterval(raw.to_string());
    let mut total = Duration::ZERO;
    let mut digits = String::new();

    for c in raw.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let value: u64 = digits.parse().map_err(|_| invalid())?;
        digits.clear();
        let unit: u64 = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let secs = value.checked_mul(unit).ok_or_else(invalid)?;
        total = total
            .checked_add(Duration::from_secs(secs))
            .ok_or_else(invalid)?;
    }

    if !digits.is_empty() || total.is_zero() || total > MAX_INTERVAL {
        return Err(invalid());
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_parse() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
    }

    #[test]
    fn overflowing_intervals_are_config_errors() {
        assert!(matches!(
            parse_interval("9999999999999999999h"),
            Err(TriviaError::InvalidInterval(_))
        ));
        assert!(matches!(
            parse_interval("18446744073709551615s1s"),
            Err(TriviaError::InvalidInterval(_))
        ));
        assert!(parse_interval("100000h").is_err());
        assert_eq!(parse_interval("8784h").unwrap(), MAX_INTERVAL);
    }

    #[test]
    fn bad_intervals_are_rejected() {
        let rejected = [
            "",
            "5",
            "m",
            "10x",
            "0s",
            "1h30",
            "9999999999999999999h",
            "99999999999999999999s",
        ];
        for raw in rejected {
            assert!(parse_interval(raw).is_err(), "{} should be rejected", raw);
        }
    }

    #[test]
    fn no_paths_is_a_config_error() {
        let config = Config::parse_from(["trivia"]);
        assert!(matches!(config.load_options(), Err(TriviaError::NoPaths)));
    }

    #[test]
    fn unresolvable_paths_are_dropped() {
        let config = Config::parse_from(["trivia", "-f", "/does/not/exist.trivia"]);
        assert!(matches!(config.load_options(), Err(TriviaError::NoPaths)));
    }

    #[test]
    fn defaults_match_documentation() {
        let config = Config::parse_from(["trivia", "--bind", "127.0.0.1"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.extension, ".trivia");
        assert!(config.bind_addr().is_ok());
        assert!(config.reload_every().unwrap().is_none());

        let config = Config::parse_from(["trivia", "--bind", "not-an-ip"]);
        assert!(matches!(config.bind_addr(), Err(TriviaError::InvalidBind(_))));
    }
}
