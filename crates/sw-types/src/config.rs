//! Sweep configuration: the declarative search-space description and its schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::distribution::Distribution;
use crate::errors::{SwError, SwResult};
use crate::validation_error;

/// Top-level keys a sweep description may carry.
const TOP_LEVEL_KEYS: &[&str] = &[
    "method",
    "parameters",
    "metric",
    "name",
    "description",
    "program",
    "command",
    "project",
    "entity",
    "early_terminate",
    "run_cap",
];

/// Keys a single parameter specification may carry.
const PARAMETER_KEYS: &[&str] = &[
    "value",
    "values",
    "probabilities",
    "min",
    "max",
    "distribution",
    "q",
    "mu",
    "sigma",
    "a",
    "b",
    "parameters",
];

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Search strategy named by a sweep description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Grid,
    Random,
    Bayes,
    Custom,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Random => "random",
            Self::Bayes => "bayes",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "random" => Ok(Self::Random),
            "bayes" => Ok(Self::Bayes),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown method {other:?}")),
        }
    }
}

/// Whether the tracked metric should go up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Minimize,
    Maximize,
}

/// The metric a sweep optimizes. Grid search ignores it but the schema checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub goal: Goal,
    #[serde(default)]
    pub target: Option<f64>,
}

/// A sweep description as supplied by the orchestrator.
///
/// Stored as the raw JSON object so that unvalidated descriptions can still be
/// inspected; typed accessors expose the parts the search strategies read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepConfig {
    inner: Map<String, Value>,
}

impl SweepConfig {
    /// Wrap a description without checking it against the schema.
    pub fn from_value(value: Value) -> SwResult<Self> {
        match value {
            Value::Object(inner) => Ok(Self { inner }),
            other => Err(validation_error!(
                "sweep config must be a JSON object, got {}",
                json_type(&other)
            )),
        }
    }

    /// Wrap a description and check it against the schema.
    pub fn validated(value: Value) -> SwResult<Self> {
        let config = Self::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner)
    }

    /// The declared method, if present and recognised.
    pub fn method(&self) -> Option<Method> {
        self.inner.get("method")?.as_str()?.parse().ok()
    }

    /// The raw `parameters` section, if present.
    pub fn parameters(&self) -> Option<&Value> {
        self.inner.get("parameters")
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.get("name")?.as_str()
    }

    pub fn metric(&self) -> Option<Metric> {
        serde_json::from_value(self.inner.get("metric")?.clone()).ok()
    }

    /// Check the description against the sweep-config schema.
    pub fn validate(&self) -> SwResult<()> {
        for key in self.inner.keys() {
            if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
                return Err(validation_error!("unknown top-level key {key:?}"));
            }
        }

        if let Some(method) = self.inner.get("method") {
            let parsed = method.as_str().map(Method::from_str);
            if !matches!(parsed, Some(Ok(_))) {
                return Err(validation_error!(
                    "method must be one of grid, random, bayes, custom; got {method}"
                ));
            }
        }

        if let Some(metric) = self.inner.get("metric") {
            serde_json::from_value::<Metric>(metric.clone())
                .map_err(|e| validation_error!("invalid metric: {e}"))?;
        }

        for key in ["name", "description", "program", "project", "entity"] {
            if let Some(value) = self.inner.get(key) {
                if !value.is_string() {
                    return Err(validation_error!("{key} must be a string"));
                }
            }
        }

        if let Some(command) = self.inner.get("command") {
            if !command.is_array() {
                return Err(validation_error!("command must be an array"));
            }
        }

        if let Some(early_terminate) = self.inner.get("early_terminate") {
            if !early_terminate.is_object() {
                return Err(validation_error!("early_terminate must be an object"));
            }
        }

        if let Some(run_cap) = self.inner.get("run_cap") {
            if !matches!(run_cap.as_u64(), Some(n) if n > 0) {
                return Err(validation_error!("run_cap must be a positive integer"));
            }
        }

        // `parameters` may be absent; callers decide whether that is fatal.
        if let Some(parameters) = self.inner.get("parameters") {
            validate_parameter_group("parameters", parameters)?;
        }

        Ok(())
    }
}

impl TryFrom<Value> for SweepConfig {
    type Error = SwError;

    fn try_from(value: Value) -> SwResult<Self> {
        Self::from_value(value)
    }
}

impl From<SweepConfig> for Value {
    fn from(config: SweepConfig) -> Self {
        config.into_value()
    }
}

fn validate_parameter_group(path: &str, group: &Value) -> SwResult<()> {
    let entries = group
        .as_object()
        .ok_or_else(|| validation_error!("{path} must be an object"))?;
    if entries.is_empty() {
        return Err(validation_error!("{path} must declare at least one parameter"));
    }
    for (name, spec) in entries {
        let child = if path == "parameters" {
            name.clone()
        } else {
            format!("{path}.{name}")
        };
        validate_parameter(&child, spec)?;
    }
    Ok(())
}

fn validate_parameter(name: &str, spec: &Value) -> SwResult<()> {
    let spec = spec
        .as_object()
        .ok_or_else(|| validation_error!("parameter {name} must be an object"))?;

    if let Some(key) = spec.keys().find(|k| !PARAMETER_KEYS.contains(&k.as_str())) {
        return Err(validation_error!("parameter {name} has unknown key {key:?}"));
    }

    if let Some(nested) = spec.get("parameters") {
        if spec.len() != 1 {
            return Err(validation_error!(
                "parameter group {name} may only contain \"parameters\""
            ));
        }
        return validate_parameter_group(name, nested);
    }

    let distribution = match spec.get("distribution") {
        None => None,
        Some(raw) => Some(
            raw.as_str()
                .ok_or_else(|| validation_error!("parameter {name}: distribution must be a string"))?
                .parse::<Distribution>()
                .map_err(|e| validation_error!("parameter {name}: {e}"))?,
        ),
    };

    if spec.contains_key("value") {
        allow_keys(name, spec, &["value", "distribution"])?;
        return expect_distribution(name, distribution, |d| d == Distribution::Constant);
    }

    if let Some(values) = spec.get("values") {
        let values = values
            .as_array()
            .ok_or_else(|| validation_error!("parameter {name}: values must be an array"))?;
        if values.is_empty() {
            return Err(validation_error!("parameter {name}: values must not be empty"));
        }
        if values.iter().any(Value::is_null) {
            return Err(validation_error!("parameter {name}: values must not contain null"));
        }

        if let Some(probabilities) = spec.get("probabilities") {
            allow_keys(name, spec, &["values", "probabilities", "distribution"])?;
            expect_distribution(name, distribution, |d| d == Distribution::CategoricalWProbabilities)?;
            return validate_probabilities(name, probabilities, values.len());
        }

        allow_keys(name, spec, &["values", "distribution"])?;
        return expect_distribution(name, distribution, |d| d == Distribution::Categorical);
    }

    if spec.contains_key("min") || spec.contains_key("max") {
        allow_keys(name, spec, &["min", "max", "distribution", "q"])?;
        expect_distribution(name, distribution, |d| d.is_range())?;
        let (min, max) = match (spec.get("min"), spec.get("max")) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(validation_error!(
                    "parameter {name}: min and max must be given together"
                ))
            }
        };
        let (lo, hi) = match (min.as_f64(), max.as_f64()) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Err(validation_error!("parameter {name}: min and max must be numbers")),
        };
        if lo >= hi {
            return Err(validation_error!(
                "parameter {name}: min ({min}) must be less than max ({max})"
            ));
        }
        if distribution == Some(Distribution::IntUniform) && !(min.is_i64() && max.is_i64()) {
            return Err(validation_error!(
                "parameter {name}: int_uniform requires integer bounds"
            ));
        }
        return validate_positive(name, spec, &["q"]);
    }

    match distribution {
        Some(d) if d.is_normal() => {
            allow_keys(name, spec, &["distribution", "mu", "sigma", "q"])?;
            validate_number(name, spec, "mu")?;
            validate_positive(name, spec, &["sigma", "q"])
        }
        Some(d) if d.is_beta() => {
            allow_keys(name, spec, &["distribution", "a", "b", "q"])?;
            validate_positive(name, spec, &["a", "b", "q"])
        }
        Some(d) => Err(validation_error!(
            "parameter {name}: distribution {d} requires additional keys"
        )),
        None => Err(validation_error!(
            "parameter {name} must declare value, values, min/max or a distribution"
        )),
    }
}

fn allow_keys(name: &str, spec: &Map<String, Value>, keys: &[&str]) -> SwResult<()> {
    match spec.keys().find(|k| !keys.contains(&k.as_str())) {
        Some(key) => Err(validation_error!(
            "parameter {name}: key {key:?} is not allowed here"
        )),
        None => Ok(()),
    }
}

fn expect_distribution(
    name: &str,
    declared: Option<Distribution>,
    accepted: fn(Distribution) -> bool,
) -> SwResult<()> {
    match declared {
        Some(d) if !accepted(d) => Err(validation_error!(
            "parameter {name}: distribution {d} does not match the declared keys"
        )),
        _ => Ok(()),
    }
}

fn validate_probabilities(name: &str, probabilities: &Value, expected: usize) -> SwResult<()> {
    let probabilities = probabilities
        .as_array()
        .ok_or_else(|| validation_error!("parameter {name}: probabilities must be an array"))?;
    if probabilities.len() != expected {
        return Err(validation_error!(
            "parameter {name}: {} probabilities given for {expected} values",
            probabilities.len()
        ));
    }
    let mut total = 0.0;
    for p in probabilities {
        match p.as_f64() {
            Some(p) if p >= 0.0 => total += p,
            _ => {
                return Err(validation_error!(
                    "parameter {name}: probabilities must be non-negative numbers"
                ))
            }
        }
    }
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(validation_error!(
            "parameter {name}: probabilities sum to {total}, expected 1"
        ));
    }
    Ok(())
}

fn validate_number(name: &str, spec: &Map<String, Value>, key: &str) -> SwResult<()> {
    match spec.get(key) {
        Some(v) if !v.is_number() => Err(validation_error!("parameter {name}: {key} must be a number")),
        _ => Ok(()),
    }
}

fn validate_positive(name: &str, spec: &Map<String, Value>, keys: &[&str]) -> SwResult<()> {
    for key in keys {
        if let Some(v) = spec.get(*key) {
            if !matches!(v.as_f64(), Some(x) if x > 0.0) {
                return Err(validation_error!("parameter {name}: {key} must be positive"));
            }
        }
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
