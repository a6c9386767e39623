//! Typed model parameters, declared schemas, and caller overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value attached to a model: a scalar or a per-period series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Series(_) => ParamKind::Series,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(values: Vec<f64>) -> Self {
        ParamValue::Series(values)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(value) => write!(f, "{}", value),
            ParamValue::Series(values) => write!(f, "series[{}]", values.len()),
        }
    }
}

/// Kind of a parameter, used for override validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Scalar,
    Series,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Scalar => write!(f, "scalar"),
            ParamKind::Series => write!(f, "series"),
        }
    }
}

/// Declared parameter names and kinds for one model variant.
///
/// The schema is the allow-list consulted before any override is applied;
/// names outside it are rejected instead of silently attached to the model.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    entries: BTreeMap<String, ParamKind>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a scalar parameter.
    pub fn scalar(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), ParamKind::Scalar);
        self
    }

    /// Declare a per-period series parameter.
    pub fn series(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), ParamKind::Series);
        self
    }

    /// Declared kind of `name`, if the schema knows it.
    pub fn kind_of(&self, name: &str) -> Option<ParamKind> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Declared names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An ordered collection of caller-supplied parameter overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamOverrides {
    entries: Vec<(String, ParamValue)>,
}

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.entries.push((name.to_string(), value.into()));
    }

    /// Overrides in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lookup() {
        let schema = ParamSchema::new()
            .scalar("power_rating_mw")
            .series("price");

        assert_eq!(schema.kind_of("power_rating_mw"), Some(ParamKind::Scalar));
        assert_eq!(schema.kind_of("price"), Some(ParamKind::Series));
        assert_eq!(schema.kind_of("nonsense"), None);
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn overrides_preserve_order() {
        let overrides = ParamOverrides::new()
            .set("b", 2.0)
            .set("a", vec![1.0, 2.0]);

        let names: Vec<&str> = overrides.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(overrides.len(), 2);
    }

    #[test]
    fn value_kinds() {
        assert_eq!(ParamValue::from(1.0).kind(), ParamKind::Scalar);
        assert_eq!(ParamValue::from(vec![1.0]).kind(), ParamKind::Series);
    }
}
