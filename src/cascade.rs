//! Ordered fallback chains of interchangeable strategies
//!
//! A [`Cascade`] tries each [`Strategy`] in turn and returns the first
//! success. Errors never leave the runner: a failing stage is logged and the
//! next one is attempted, and an exhausted chain yields `None`.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Instant;

/// A single self-contained attempt at producing a result
#[async_trait]
pub trait Strategy<I: ?Sized + Sync, O: Send>: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Try to produce a result for `input`
    ///
    /// # Errors
    /// Any failure; the cascade moves on to the next strategy.
    async fn attempt(&self, input: &I) -> Result<O>;
}

/// Ordered list of strategies sharing one signature
pub struct Cascade<I: ?Sized + Sync, O: Send> {
    label: String,
    strategies: Vec<Box<dyn Strategy<I, O>>>,
}

impl<I: ?Sized + Sync, O: Send> Cascade<I, O> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy; order of insertion is order of attempts
    #[must_use]
    pub fn with(mut self, strategy: impl Strategy<I, O> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy<I, O>>) {
        self.strategies.push(strategy);
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Strategy names in attempt order
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order until one succeeds
    pub async fn run(&self, input: &I) -> Option<O> {
        let cascade_start = Instant::now();

        for (index, strategy) in self.strategies.iter().enumerate() {
            let stage_start = Instant::now();
            match strategy.attempt(input).await {
                Ok(output) => {
                    tracing::info!(
                        cascade = %self.label,
                        stage = strategy.name(),
                        position = index + 1,
                        elapsed_ms = stage_start.elapsed().as_millis() as u64,
                        "stage succeeded"
                    );
                    return Some(output);
                },
                Err(e) => {
                    tracing::warn!(
                        cascade = %self.label,
                        stage = strategy.name(),
                        kind = ?e.kind(),
                        error = %e,
                        "stage failed, trying next"
                    );
                },
            }
        }

        tracing::warn!(
            cascade = %self.label,
            stages = self.strategies.len(),
            elapsed_ms = cascade_start.elapsed().as_millis() as u64,
            "all stages failed"
        );
        None
    }
}

impl<I: ?Sized + Sync, O: Send> fmt::Debug for Cascade<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cascade")
            .field("label", &self.label)
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockStrategy;

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = MockStrategy::failing("first");
        let second = MockStrategy::succeeding("second", 2);
        let third = MockStrategy::succeeding("third", 3);
        let (c1, c2, c3) = (first.calls(), second.calls(), third.calls());

        let cascade = Cascade::<u32, u32>::new("test")
            .with(first)
            .with(second)
            .with(third);

        assert_eq!(cascade.run(&7).await, Some(2));
        assert_eq!(c1.get(), 1);
        assert_eq!(c2.get(), 1);
        assert_eq!(c3.get(), 0);
    }

    #[tokio::test]
    async fn test_all_failures_yield_none() {
        let cascade = Cascade::<u32, u32>::new("test")
            .with(MockStrategy::failing("a"))
            .with(MockStrategy::failing("b"));

        assert_eq!(cascade.run(&1).await, None);
    }

    #[tokio::test]
    async fn test_empty_cascade() {
        let cascade = Cascade::<u32, u32>::new("empty");
        assert!(cascade.is_empty());
        assert_eq!(cascade.run(&1).await, None);
    }

    #[test]
    fn test_strategy_names_in_order() {
        let cascade = Cascade::<u32, u32>::new("names")
            .with(MockStrategy::failing("x"))
            .with(MockStrategy::failing("y"));
        assert_eq!(cascade.strategy_names(), vec!["x", "y"]);
        assert_eq!(cascade.len(), 2);
        assert!(format!("{cascade:?}").contains("names"));
    }
}
