//! Exhaustive grid search over categorical parameters.
//!
//! Every call rebuilds the full Cartesian product of candidate values, removes
//! the points already present in the supplied run history and emits up to
//! `count` of the rest. The product grows multiplicatively with the number of
//! parameters; grids too large to hold in memory are out of reach.

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use sw_types::{unwrap_value, wrap_value, ConfigError, Method, SweepConfig, SweepRun, SwResult};

use crate::canonical::{CanonicalValue, GridKey};
use crate::params::{GridParameters, HyperParameterSet};
use crate::search::{SearchStrategy, Suggestion};

/// Request options for grid suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearchOptions {
    /// Check the sweep description against the schema first.
    pub validate: bool,
    /// Maximum number of runs to suggest.
    pub count: usize,
    /// Shuffle the unexplored points before picking.
    pub randomize_order: bool,
}

impl Default for GridSearchOptions {
    fn default() -> Self {
        Self {
            validate: false,
            count: 1,
            randomize_order: false,
        }
    }
}

/// Suggest up to `options.count` unexplored grid points.
pub fn next_runs(
    runs: &[SweepRun],
    config: &SweepConfig,
    options: &GridSearchOptions,
    rng: &mut dyn RngCore,
) -> SwResult<Vec<Suggestion>> {
    GridSearch::from_options(options).next_runs(runs, config, options.count, rng)
}

/// Suggest a single unexplored grid point, or `None` once the grid is covered.
///
/// The description is always validated in this form.
pub fn next_run(
    runs: &[SweepRun],
    config: &SweepConfig,
    randomize_order: bool,
    rng: &mut dyn RngCore,
) -> SwResult<Option<SweepRun>> {
    GridSearch::new()
        .with_validation(true)
        .with_randomized_order(randomize_order)
        .next_run(runs, config, rng)
}

// ---- Grid search ----

/// Exhaustive grid search over discrete parameter combinations.
#[derive(Debug, Clone, Default)]
pub struct GridSearch {
    validate: bool,
    randomize_order: bool,
}

impl GridSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &GridSearchOptions) -> Self {
        Self {
            validate: options.validate,
            randomize_order: options.randomize_order,
        }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_randomized_order(mut self, randomize_order: bool) -> Self {
        self.randomize_order = randomize_order;
        self
    }

    /// Validate (if requested) and classify the description's parameters.
    pub fn grid_parameters(&self, config: &SweepConfig) -> SwResult<GridParameters> {
        if self.validate {
            config.validate()?;
        }

        if let Some(method) = config.get("method") {
            if method.as_str() != Some(Method::Grid.as_str()) {
                return Err(ConfigError::WrongMethod {
                    expected: Method::Grid.as_str().to_string(),
                    found: method
                        .as_str()
                        .map_or_else(|| method.to_string(), str::to_string),
                }
                .into());
            }
        }

        let parameters = config.parameters().ok_or(ConfigError::MissingParameters)?;
        HyperParameterSet::from_config(parameters)?.into_grid()
    }
}

impl SearchStrategy for GridSearch {
    fn next_runs(
        &self,
        runs: &[SweepRun],
        config: &SweepConfig,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> SwResult<Vec<Suggestion>> {
        let params = self.grid_parameters(config)?;
        let grid = Grid::new(&params);

        let seen = grid.seen(runs);
        let mut remaining = grid.remaining(&seen);
        let n_remaining = remaining.len();

        if self.randomize_order {
            remaining.shuffle(rng);
        }

        let mut suggestions: Vec<Suggestion> = remaining
            .iter()
            .take(count)
            .map(|point| Suggestion::Run(grid.materialize(point)))
            .collect();

        if count > n_remaining {
            if n_remaining == 0 {
                info!("Grid exhausted after {} observed runs", runs.len());
            }
            suggestions.push(Suggestion::Exhausted);
        }

        Ok(suggestions)
    }

    fn name(&self) -> &str {
        "grid"
    }
}

/// A grid point as one candidate index per categorical parameter.
type GridPoint = Vec<usize>;

/// The categorical axes of a search space in canonical form.
struct Grid<'a> {
    params: &'a GridParameters,
    axes: Vec<Vec<CanonicalValue>>,
}

impl<'a> Grid<'a> {
    fn new(params: &'a GridParameters) -> Self {
        let axes = params
            .categorical
            .iter()
            .map(|p| p.values.iter().map(CanonicalValue::from_json).collect())
            .collect();
        Self { params, axes }
    }

    /// Canonical assignments of the observed runs.
    ///
    /// A run that lacks any categorical parameter cannot match a grid point and
    /// is left out; extra keys are ignored.
    fn seen(&self, runs: &[SweepRun]) -> HashSet<GridKey> {
        let mut seen = HashSet::with_capacity(runs.len());
        for run in runs {
            match self.project(run) {
                Some(key) => {
                    seen.insert(key);
                }
                None => debug!("Run {} lacks a grid parameter; not deduplicated", run.id),
            }
        }
        seen
    }

    fn project(&self, run: &SweepRun) -> Option<GridKey> {
        self.params
            .categorical
            .iter()
            .map(|p| lookup(&run.config, &p.path).map(CanonicalValue::from_json))
            .collect()
    }

    /// Grid points not in `seen`, in product order.
    ///
    /// Candidates that canonicalize identically collapse to their first
    /// occurrence.
    fn remaining(&self, seen: &HashSet<GridKey>) -> Vec<GridPoint> {
        let capacity = match self.params.grid_size() {
            Some(size) => size,
            None => {
                warn!("Grid size overflows usize; enumeration will not finish");
                0
            }
        };

        let mut universe: HashSet<GridKey> = HashSet::with_capacity(capacity);
        let mut remaining = Vec::new();
        let mut indices: GridPoint = vec![0; self.axes.len()];

        'product: loop {
            let key: GridKey = indices
                .iter()
                .zip(&self.axes)
                .map(|(&i, axis)| axis[i].clone())
                .collect();
            if seen.contains(&key) {
                universe.insert(key);
            } else if universe.insert(key) {
                remaining.push(indices.clone());
            }

            // odometer, last axis fastest
            let mut axis = self.axes.len();
            loop {
                if axis == 0 {
                    break 'product;
                }
                axis -= 1;
                indices[axis] += 1;
                if indices[axis] < self.axes[axis].len() {
                    break;
                }
                indices[axis] = 0;
            }
        }

        debug!(
            "Grid has {} points, {} observed, {} remaining",
            universe.len(),
            seen.len(),
            remaining.len()
        );
        remaining
    }

    /// Build the run for a grid point, with constants reattached.
    fn materialize(&self, point: &[usize]) -> SweepRun {
        let mut config = Map::new();
        for (param, &i) in self.params.categorical.iter().zip(point) {
            insert_path(&mut config, &param.path, param.values[i].clone());
        }
        for constant in &self.params.constants {
            insert_path(&mut config, &constant.path, constant.value.clone());
        }
        SweepRun::new(config)
    }
}

/// Find a parameter's recorded value, descending into nested groups.
fn lookup<'v>(config: &'v Map<String, Value>, path: &[String]) -> Option<&'v Value> {
    let (head, rest) = path.split_first()?;
    let mut current = unwrap_value(config.get(head)?);
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Insert `value` at `path`: the top-level key is wrapped as `{"value": ...}`,
/// nested members sit as plain keys inside the group's value object.
fn insert_path(config: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        config.insert(head.clone(), wrap_value(value));
        return;
    }
    let group = config
        .entry(head.clone())
        .or_insert_with(|| wrap_value(Value::Object(Map::new())));
    if let Some(Value::Object(members)) = group.get_mut("value") {
        insert_member(members, rest, value);
    }
}

fn insert_member(members: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        members.insert(head.clone(), value);
        return;
    }
    let child = members
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(inner) = child {
        insert_member(inner, rest, value);
    }
}
