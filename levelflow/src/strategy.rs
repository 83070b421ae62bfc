//! Execution strategies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the tasks of a level are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One task at a time, level by level, in stored order (default).
    #[default]
    Sequential,
    /// Every task of a level concurrently, with a barrier between levels.
    Parallel,
}

impl Strategy {
    /// Returns the strategy's config name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!("unknown execution strategy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sequential() {
        assert_eq!(Strategy::default(), Strategy::Sequential);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Parallel".parse::<Strategy>(), Ok(Strategy::Parallel));
        assert_eq!(Strategy::Sequential.to_string(), "sequential");
        assert!("eager".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Strategy::Parallel).unwrap(), "\"parallel\"");
        let parsed: Strategy = serde_json::from_str("\"sequential\"").unwrap();
        assert_eq!(parsed, Strategy::Sequential);
    }
}
