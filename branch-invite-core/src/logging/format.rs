//! Rendering of log events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How each event is written out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, one event per line with all fields
    #[default]
    Full,
    /// Shorter lines for interactive terminals
    Compact,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "pretty" => Ok(LogFormat::Full),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Compact ".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Full));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for format in [LogFormat::Full, LogFormat::Compact, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>(), Ok(format));
        }
    }
}
