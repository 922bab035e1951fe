//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services as `Arc<CoreConfig>`. The intent is to avoid reading
//! process-wide environment variables during request handling, which can
//! lead to inconsistent behaviour in multi-threaded runtimes and test
//! harnesses.

use crate::error::{QueueError, QueueResult};

/// Default page size for queue listings when the caller does not supply one.
pub const DEFAULT_PER_PAGE: usize = 20;

/// Upper bound on caller-supplied page sizes.
pub const MAX_PER_PAGE: usize = 200;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    default_per_page: usize,
    max_per_page: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidInput` if either bound is zero or the
    /// default exceeds the maximum.
    pub fn new(default_per_page: usize, max_per_page: usize) -> QueueResult<Self> {
        if default_per_page == 0 || max_per_page == 0 {
            return Err(QueueError::InvalidInput(
                "page sizes must be greater than zero".into(),
            ));
        }
        if default_per_page > max_per_page {
            return Err(QueueError::InvalidInput(format!(
                "default_per_page ({default_per_page}) exceeds max_per_page ({max_per_page})"
            )));
        }

        Ok(Self {
            default_per_page,
            max_per_page,
        })
    }

    pub fn default_per_page(&self) -> usize {
        self.default_per_page
    }

    pub fn max_per_page(&self) -> usize {
        self.max_per_page
    }

    /// Clamp a caller-supplied page size into the configured bounds,
    /// substituting the default when absent.
    pub fn effective_per_page(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.default_per_page,
            Some(n) => n.min(self.max_per_page),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_page_sizes() {
        assert!(CoreConfig::new(0, 10).is_err());
        assert!(CoreConfig::new(10, 0).is_err());
    }

    #[test]
    fn test_rejects_default_above_max() {
        assert!(CoreConfig::new(50, 10).is_err());
    }

    #[test]
    fn test_effective_per_page_clamps_and_defaults() {
        let cfg = CoreConfig::new(20, 100).unwrap();
        assert_eq!(cfg.effective_per_page(None), 20);
        assert_eq!(cfg.effective_per_page(Some(0)), 20);
        assert_eq!(cfg.effective_per_page(Some(55)), 55);
        assert_eq!(cfg.effective_per_page(Some(1_000)), 100);
    }
}
