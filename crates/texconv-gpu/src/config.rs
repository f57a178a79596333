//! Session configuration.
//!
//! # Environment Variables
//!
//! - `TEXCONV_POOL_MIN` - buffers preallocated by the output pool
//! - `TEXCONV_POOL_MAX` - upper bound of pooled buffers, 0 for unbounded
//! - `TEXCONV_EAGER_COMPILE` - compile when formats are set ("1" or "true")

use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunables of a [`ColorConvert`](crate::ColorConvert) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Output buffers allocated as soon as the pool is created.
    pub pool_min_buffers: usize,
    /// Maximum outstanding output buffers, 0 for unbounded.
    pub pool_max_buffers: usize,
    /// Compile the shader program in `set_formats` instead of on the first frame.
    pub eager_compile: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            pool_min_buffers: 1,
            pool_max_buffers: 0,
            eager_compile: false,
        }
    }
}

impl ConvertConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `TEXCONV_*` overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(min) = env_usize("TEXCONV_POOL_MIN") {
            self.pool_min_buffers = min;
        }
        if let Some(max) = env_usize("TEXCONV_POOL_MAX") {
            self.pool_max_buffers = max;
        }
        if let Ok(v) = env::var("TEXCONV_EAGER_COMPILE") {
            self.eager_compile = v == "1" || v.eq_ignore_ascii_case("true");
        }
        debug!(config = ?self, "convert config");
        self
    }
}

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.pool_min_buffers, 1);
        assert_eq!(config.pool_max_buffers, 0);
        assert!(!config.eager_compile);
    }

    #[test]
    fn test_env_overrides() {
        // SAFETY: only this test touches these variables.
        unsafe {
            env::set_var("TEXCONV_POOL_MAX", "3");
            env::set_var("TEXCONV_EAGER_COMPILE", "true");
        }
        let config = ConvertConfig::from_env();
        unsafe {
            env::remove_var("TEXCONV_POOL_MAX");
            env::remove_var("TEXCONV_EAGER_COMPILE");
        }
        assert_eq!(config.pool_max_buffers, 3);
        assert!(config.eager_compile);
        assert_eq!(config.pool_min_buffers, 1);
    }
}
