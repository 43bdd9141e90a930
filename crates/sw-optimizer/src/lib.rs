//! # sw-optimizer
//!
//! Grid search suggestions for hyperparameter sweeps.
//!
//! Classifies the parameters of a sweep description, enumerates the discrete
//! grid they span, subtracts the configurations already present in the run
//! history and hands back the next batch of runs, ending the batch with an
//! explicit exhaustion marker once the grid is covered.

mod canonical;
mod grid;
mod params;
mod search;

pub use canonical::{CanonicalValue, GridKey};
pub use grid::{next_run, next_runs, GridSearch, GridSearchOptions};
pub use params::{
    CategoricalParameter, ConstantParameter, GridParameters, HyperParameter, HyperParameterSet,
    ParameterKind, PATH_SEPARATOR,
};
pub use search::{strategy_for, SearchStrategy, Suggestion};
