//! Parameter classification: turning a `parameters` section into typed parameters.

use serde_json::{Map, Value};
use std::collections::HashSet;
use sw_types::{config_error, ConfigError, Distribution, SwResult};

/// Separator between group and member names of nested parameters.
pub const PATH_SEPARATOR: &str = ".";

/// What a declared parameter asks the search to do with it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// One fixed value shared by every run.
    Constant { value: Value },
    /// A finite, ordered list of candidate values.
    Categorical { values: Vec<Value> },
    /// Any sampled distribution (ranges, normal, beta, weighted choices).
    Sampled { distribution: Distribution },
}

impl ParameterKind {
    pub fn distribution(&self) -> Distribution {
        match self {
            Self::Constant { .. } => Distribution::Constant,
            Self::Categorical { .. } => Distribution::Categorical,
            Self::Sampled { distribution } => *distribution,
        }
    }
}

/// A single declared hyperparameter.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParameter {
    /// Dotted name (e.g. "optimizer.lr" for a member of a nested group).
    pub name: String,
    /// Group names followed by the parameter's own key.
    pub path: Vec<String>,
    pub kind: ParameterKind,
}

impl HyperParameter {
    pub fn from_spec(path: Vec<String>, spec: &Map<String, Value>) -> SwResult<Self> {
        let name = path.join(PATH_SEPARATOR);
        let kind = classify(&name, spec)?;
        Ok(Self { name, path, kind })
    }

    pub fn is_grid_compatible(&self) -> bool {
        self.kind.distribution().is_grid_compatible()
    }
}

fn classify(name: &str, spec: &Map<String, Value>) -> SwResult<ParameterKind> {
    let declared = match spec.get("distribution") {
        None => None,
        Some(raw) => Some(
            raw.as_str()
                .and_then(|s| s.parse::<Distribution>().ok())
                .ok_or_else(|| config_error!(name, "unrecognized distribution {raw}"))?,
        ),
    };

    match declared {
        Some(Distribution::Constant) => constant(name, spec),
        Some(Distribution::Categorical) => categorical(name, spec),
        Some(distribution) => Ok(ParameterKind::Sampled { distribution }),
        None if spec.contains_key("value") => constant(name, spec),
        None if spec.contains_key("values") => {
            if spec.contains_key("probabilities") {
                Ok(ParameterKind::Sampled {
                    distribution: Distribution::CategoricalWProbabilities,
                })
            } else {
                categorical(name, spec)
            }
        }
        None if spec.contains_key("min") || spec.contains_key("max") => {
            let integral = |key: &str| spec.get(key).is_some_and(Value::is_i64);
            let distribution = if integral("min") && integral("max") {
                Distribution::IntUniform
            } else {
                Distribution::Uniform
            };
            Ok(ParameterKind::Sampled { distribution })
        }
        None => Err(config_error!(
            name,
            "cannot infer a distribution; expected value, values or min/max"
        )),
    }
}

fn constant(name: &str, spec: &Map<String, Value>) -> SwResult<ParameterKind> {
    let value = spec
        .get("value")
        .ok_or_else(|| config_error!(name, "constant parameter requires \"value\""))?;
    Ok(ParameterKind::Constant {
        value: value.clone(),
    })
}

fn categorical(name: &str, spec: &Map<String, Value>) -> SwResult<ParameterKind> {
    match spec.get("values") {
        Some(Value::Array(values)) if !values.is_empty() => Ok(ParameterKind::Categorical {
            values: values.clone(),
        }),
        Some(Value::Array(_)) => Err(config_error!(name, "\"values\" must not be empty")),
        Some(_) => Err(config_error!(name, "\"values\" must be an array")),
        None => Err(config_error!(name, "categorical parameter requires \"values\"")),
    }
}

/// The full, flattened set of declared parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HyperParameterSet {
    params: Vec<HyperParameter>,
}

impl HyperParameterSet {
    /// Build from a `parameters` section, flattening nested groups.
    pub fn from_config(parameters: &Value) -> SwResult<Self> {
        let mut params = Vec::new();
        collect(parameters, &[], &mut params)?;

        let mut names = HashSet::with_capacity(params.len());
        for param in &params {
            if !names.insert(param.name.as_str()) {
                return Err(config_error!(param.name, "duplicate parameter name"));
            }
        }
        Ok(Self { params })
    }

    pub fn iter(&self) -> impl Iterator<Item = &HyperParameter> {
        self.params.iter()
    }

    /// Names of parameters a grid cannot enumerate, sorted by name.
    pub fn rejected_for_grid(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.is_grid_compatible())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Partition into categorical and constant parameters.
    ///
    /// Fails if any parameter is of another kind; nothing is skipped.
    pub fn into_grid(self) -> SwResult<GridParameters> {
        let rejected = self.rejected_for_grid();
        if !rejected.is_empty() {
            return Err(ConfigError::DisallowedParameters { names: rejected }.into());
        }

        let mut grid = GridParameters::default();
        for param in self.params {
            match param.kind {
                ParameterKind::Categorical { values } => grid.categorical.push(CategoricalParameter {
                    name: param.name,
                    path: param.path,
                    values,
                }),
                ParameterKind::Constant { value } => grid.constants.push(ConstantParameter {
                    name: param.name,
                    path: param.path,
                    value,
                }),
                ParameterKind::Sampled { .. } => {}
            }
        }
        Ok(grid)
    }
}

fn collect(group: &Value, prefix: &[String], out: &mut Vec<HyperParameter>) -> SwResult<()> {
    let group_name = prefix.join(PATH_SEPARATOR);
    let entries = group.as_object().ok_or_else(|| {
        if prefix.is_empty() {
            config_error!("parameters", "expected an object")
        } else {
            config_error!(group_name, "\"parameters\" must be an object")
        }
    })?;

    for (key, spec) in entries {
        let mut path = prefix.to_vec();
        path.push(key.clone());
        let spec = spec
            .as_object()
            .ok_or_else(|| config_error!(path.join(PATH_SEPARATOR), "expected an object"))?;

        match spec.get("parameters") {
            Some(nested) => collect(nested, &path, out)?,
            None => out.push(HyperParameter::from_spec(path, spec)?),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalParameter {
    pub name: String,
    pub path: Vec<String>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantParameter {
    pub name: String,
    pub path: Vec<String>,
    pub value: Value,
}

/// Parameters of a search space that passed grid classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridParameters {
    pub categorical: Vec<CategoricalParameter>,
    pub constants: Vec<ConstantParameter>,
}

impl GridParameters {
    /// Number of grid points before deduplication, or `None` on overflow.
    pub fn grid_size(&self) -> Option<usize> {
        self.categorical
            .iter()
            .try_fold(1usize, |total, p| total.checked_mul(p.values.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sw_types::SwError;

    fn kinds(parameters: Value) -> Vec<(String, Distribution)> {
        HyperParameterSet::from_config(&parameters)
            .unwrap()
            .iter()
            .map(|p| (p.name.clone(), p.kind.distribution()))
            .collect()
    }

    #[test]
    fn infers_kind_from_keys() {
        let found = kinds(json!({
            "a": {"value": 1},
            "b": {"values": [1, 2]},
            "c": {"values": [1, 2], "probabilities": [0.5, 0.5]},
            "d": {"min": 1, "max": 10},
            "e": {"min": 0.1, "max": 1.0},
            "f": {"min": 1, "max": 2.5},
        }));
        assert_eq!(
            found,
            vec![
                ("a".to_string(), Distribution::Constant),
                ("b".to_string(), Distribution::Categorical),
                ("c".to_string(), Distribution::CategoricalWProbabilities),
                ("d".to_string(), Distribution::IntUniform),
                ("e".to_string(), Distribution::Uniform),
                ("f".to_string(), Distribution::Uniform),
            ]
        );
    }

    #[test]
    fn honours_declared_distribution() {
        let found = kinds(json!({
            "a": {"distribution": "constant", "value": "x"},
            "b": {"distribution": "categorical", "values": ["x"]},
            "c": {"distribution": "log_uniform_values", "min": 0.001, "max": 0.1},
            "d": {"distribution": "q_normal", "mu": 0, "sigma": 1, "q": 1},
        }));
        assert_eq!(found[0].1, Distribution::Constant);
        assert_eq!(found[1].1, Distribution::Categorical);
        assert_eq!(found[2].1, Distribution::LogUniformValues);
        assert_eq!(found[3].1, Distribution::QNormal);
    }

    #[test]
    fn flattens_nested_groups() {
        let set = HyperParameterSet::from_config(&json!({
            "epochs": {"value": 10},
            "optimizer": {"parameters": {
                "lr": {"values": [0.1, 0.01]},
                "momentum": {"parameters": {"beta": {"value": 0.9}}},
            }},
        }))
        .unwrap();
        let names: Vec<&str> = set.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["epochs", "optimizer.lr", "optimizer.momentum.beta"]);
        let beta = set.iter().last().unwrap();
        assert_eq!(beta.path, vec!["optimizer", "momentum", "beta"]);
    }

    #[test]
    fn rejects_dotted_name_collisions() {
        let err = HyperParameterSet::from_config(&json!({
            "a.b": {"value": 1},
            "a": {"parameters": {"b": {"value": 2}}},
        }))
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn malformed_specs_are_configuration_errors() {
        for parameters in [
            json!([1, 2]),
            json!({"a": 3}),
            json!({"a": {}}),
            json!({"a": {"values": []}}),
            json!({"a": {"values": "xyz"}}),
            json!({"a": {"distribution": "categorical"}}),
            json!({"a": {"distribution": "bogus", "values": [1]}}),
            json!({"g": {"parameters": 5}}),
        ] {
            let err = HyperParameterSet::from_config(&parameters).unwrap_err();
            assert!(err.is_config(), "{parameters} gave {err:?}");
        }
    }

    #[test]
    fn into_grid_partitions_parameters() {
        let grid = HyperParameterSet::from_config(&json!({
            "v1": {"values": [1, 2, 3]},
            "v2": {"values": [4, 5]},
            "seed": {"value": 42},
        }))
        .unwrap()
        .into_grid()
        .unwrap();
        assert_eq!(grid.categorical.len(), 2);
        assert_eq!(grid.constants.len(), 1);
        assert_eq!(grid.constants[0].value, json!(42));
        assert_eq!(grid.grid_size(), Some(6));
    }

    #[test]
    fn into_grid_names_every_rejected_parameter() {
        let set = HyperParameterSet::from_config(&json!({
            "v1": {"values": [[2, 3], [3, 4]]},
            "v2": {"min": 1, "max": 10},
            "v3": {"distribution": "beta", "a": 1, "b": 2},
        }))
        .unwrap();
        assert_eq!(set.rejected_for_grid(), vec!["v2", "v3"]);
        match set.into_grid() {
            Err(SwError::Config(ConfigError::DisallowedParameters { names })) => {
                assert_eq!(names, vec!["v2", "v3"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejected_names_are_sorted_regardless_of_declaration() {
        let set = HyperParameterSet::from_config(&json!({
            "z_range": {"min": 0.0, "max": 1.0},
            "m_fixed": {"value": 3},
            "a_range": {"min": 1, "max": 10},
        }))
        .unwrap();
        assert_eq!(set.rejected_for_grid(), vec!["a_range", "z_range"]);
    }

    #[test]
    fn grid_size_overflows_to_none() {
        let huge = GridParameters {
            categorical: vec![
                CategoricalParameter {
                    name: "a".into(),
                    path: vec!["a".into()],
                    values: vec![json!(0); 2],
                };
                usize::BITS as usize
            ],
            constants: Vec::new(),
        };
        assert_eq!(huge.grid_size(), None);
        assert_eq!(GridParameters::default().grid_size(), Some(1));
    }
}
