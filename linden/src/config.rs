//! Interpreter limits loaded from `linden.toml`
//!
//! ```toml
//! max_call_depth = 200
//! max_loop_iterations = 1000000
//! ```

use crate::error::{CompileError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "linden.toml";

/// Evaluation ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Nested function calls allowed before the run is aborted
    pub max_call_depth: usize,
    /// Iterations one `while` statement may run before the run is aborted
    pub max_loop_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 100,
            max_loop_iterations: 100_000,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CompileError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            CompileError::config(format!("failed to parse {}: {}", path.display(), e.message()))
        })
    }

    /// An explicit path must exist; otherwise `linden.toml` is used if present.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, max_call_depth: Option<usize>, max_loop_iterations: Option<usize>) -> Self {
        if let Some(depth) = max_call_depth {
            self.max_call_depth = depth;
        }
        if let Some(iterations) = max_loop_iterations {
            self.max_loop_iterations = iterations;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_call_depth, 100);
        assert_eq!(config.max_loop_iterations, 100_000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str("max_call_depth = 7").unwrap();
        assert_eq!(config.max_call_depth, 7);
        assert_eq!(config.max_loop_iterations, 100_000);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("max_call_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, CompileError::Config { .. }));
        assert!(Config::from_toml_str("max_depth = 3").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_toml_str("max_call_depth = 7\nmax_loop_iterations = 9")
            .unwrap()
            .with_overrides(Some(50), None);
        assert_eq!(config.max_call_depth, 50);
        assert_eq!(config.max_loop_iterations, 9);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::discover(Some(Path::new("/nonexistent/linden.toml"))).unwrap_err();
        assert!(err.message().contains("failed to read"));
    }
}
