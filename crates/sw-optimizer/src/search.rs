//! The seam search strategies plug into, and the items they return.

use rand::RngCore;
use sw_types::{Method, SweepConfig, SweepRun, SwResult};

use crate::grid::{GridSearch, GridSearchOptions};

/// One item of a suggestion batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    /// A configuration to evaluate next.
    Run(SweepRun),
    /// The search space is covered; no further configurations exist.
    Exhausted,
}

impl Suggestion {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    pub fn as_run(&self) -> Option<&SweepRun> {
        match self {
            Self::Run(run) => Some(run),
            Self::Exhausted => None,
        }
    }

    pub fn into_run(self) -> Option<SweepRun> {
        match self {
            Self::Run(run) => Some(run),
            Self::Exhausted => None,
        }
    }
}

impl From<Suggestion> for Option<SweepRun> {
    fn from(suggestion: Suggestion) -> Self {
        suggestion.into_run()
    }
}

/// Common trait for all search strategies.
///
/// Strategies hold no history of their own: every call receives the full list
/// of runs already suggested or evaluated. Callers that issue concurrent
/// requests against one history must record each suggested run before the next
/// request reads it.
pub trait SearchStrategy: Send + Sync {
    /// Suggest up to `count` new runs.
    ///
    /// When fewer than `count` configurations remain, the batch ends with
    /// [`Suggestion::Exhausted`].
    fn next_runs(
        &self,
        runs: &[SweepRun],
        config: &SweepConfig,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> SwResult<Vec<Suggestion>>;

    /// Suggest a single run, or `None` once the space is exhausted.
    fn next_run(
        &self,
        runs: &[SweepRun],
        config: &SweepConfig,
        rng: &mut dyn RngCore,
    ) -> SwResult<Option<SweepRun>> {
        let batch = self.next_runs(runs, config, 1, rng)?;
        Ok(batch.into_iter().next().and_then(Suggestion::into_run))
    }

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

/// The strategy that serves `method`, if this crate provides one.
pub fn strategy_for(method: Method, options: &GridSearchOptions) -> Option<Box<dyn SearchStrategy>> {
    match method {
        Method::Grid => Some(Box::new(GridSearch::from_options(options))),
        Method::Random | Method::Bayes | Method::Custom => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    #[test]
    fn suggestion_conversions() {
        let run = SweepRun::from_values([("a", json!(1))]);
        let suggestion = Suggestion::Run(run.clone());
        assert!(!suggestion.is_exhausted());
        assert_eq!(suggestion.as_run(), Some(&run));
        assert_eq!(Option::<SweepRun>::from(suggestion), Some(run));

        assert!(Suggestion::Exhausted.is_exhausted());
        assert_eq!(Suggestion::Exhausted.into_run(), None);
    }

    #[test]
    fn only_grid_is_served() {
        let options = GridSearchOptions::default();
        let grid = strategy_for(Method::Grid, &options).unwrap();
        assert_eq!(grid.name(), "grid");
        assert!(strategy_for(Method::Random, &options).is_none());
        assert!(strategy_for(Method::Bayes, &options).is_none());
    }

    #[test]
    fn default_next_run_unwraps_first_suggestion() {
        let strategy = strategy_for(Method::Grid, &GridSearchOptions::default()).unwrap();
        let config = SweepConfig::from_value(json!({
            "method": "grid",
            "parameters": {"a": {"values": ["only"]}},
        }))
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let first = strategy.next_run(&[], &config, &mut rng).unwrap().unwrap();
        assert_eq!(first.value("a"), Some(&json!("only")));

        let done = strategy.next_run(&[first], &config, &mut rng).unwrap();
        assert!(done.is_none());
    }
}
