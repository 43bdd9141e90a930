//! Runs: configurations that have been, or are about to be, evaluated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle state of a run as reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Pending,
    Running,
    Finished,
    Failed,
    Crashed,
    Killed,
    Preempted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

/// A single run of the sweep.
///
/// `config` maps each parameter name to a `{"value": ...}` object. Search
/// strategies only read and write `config`; everything else belongs to the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRun {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub state: RunState,
    #[serde(default)]
    pub summary_metrics: Map<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SweepRun {
    pub fn new(config: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            config,
            state: RunState::Pending,
            summary_metrics: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Build a run from plain `name -> value` pairs, wrapping each value.
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let config = values
            .into_iter()
            .map(|(k, v)| (k.into(), wrap_value(v)))
            .collect();
        Self::new(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_state(mut self, state: RunState) -> Self {
        self.state = state;
        self
    }

    /// The recorded value of a top-level parameter.
    ///
    /// Entries are normally `{"value": v}`; anything else is taken as the bare
    /// value.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.config.get(name).map(unwrap_value)
    }
}

/// Wrap a value in the `{"value": v}` shape used by run configs.
pub fn wrap_value(value: Value) -> Value {
    let mut wrapped = Map::new();
    wrapped.insert("value".to_string(), value);
    Value::Object(wrapped)
}

/// Inverse of [`wrap_value`]; bare values pass through unchanged.
pub fn unwrap_value(entry: &Value) -> &Value {
    match entry {
        Value::Object(map) => map.get("value").unwrap_or(entry),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_values_wraps_each_entry() {
        let run = SweepRun::from_values([("a", json!(1)), ("b", json!([2, 3]))]);
        assert_eq!(run.config["a"], json!({"value": 1}));
        assert_eq!(run.value("b"), Some(&json!([2, 3])));
        assert_eq!(run.value("missing"), None);
        assert_eq!(run.state, RunState::Pending);
    }

    #[test]
    fn bare_entries_are_read_as_values() {
        let mut config = Map::new();
        config.insert("a".into(), json!(7));
        config.insert("b".into(), json!({"nested": true}));
        let run = SweepRun::new(config);
        assert_eq!(run.value("a"), Some(&json!(7)));
        assert_eq!(run.value("b"), Some(&json!({"nested": true})));
    }

    #[test]
    fn deserializes_with_defaults() {
        let run: SweepRun = serde_json::from_value(json!({
            "config": {"v1": {"value": 2}},
            "state": "finished",
        }))
        .unwrap();
        assert_eq!(run.value("v1"), Some(&json!(2)));
        assert!(run.state.is_terminal());
        assert!(run.name.is_none());
        assert!(run.summary_metrics.is_empty());
    }

    #[test]
    fn builder_sets_name_and_state() {
        let run = SweepRun::from_values([("x", json!("a"))])
            .with_name("bright-sweep-1")
            .with_state(RunState::Running);
        assert_eq!(run.name.as_deref(), Some("bright-sweep-1"));
        assert!(!run.state.is_terminal());
    }
}
