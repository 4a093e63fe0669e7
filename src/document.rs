use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Resource kinds that can be cloned between orgs.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    SemanticModel,
    Visualization,
    Dashboard,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SemanticModel => "semantic-model",
            Self::Visualization => "visualization",
            Self::Dashboard => "dashboard",
        }
    }

    /// REST collection path below `/services/data/v{version}/`.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::SemanticModel => "ssot/semantic/models",
            Self::Visualization => "tableau/visualizations",
            Self::Dashboard => "tableau/dashboards",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{kind} payload is not a JSON object")]
pub struct NotAnObject {
    pub kind: ResourceKind,
}

/// A vendor document of a known kind.
///
/// The body is kept as raw JSON so fields the pipeline never inspects pass
/// through to the destination untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    kind: ResourceKind,
    body: Value,
}

impl Document {
    pub fn new(kind: ResourceKind, body: Value) -> Result<Self, NotAnObject> {
        if !body.is_object() {
            return Err(NotAnObject { kind });
        }
        Ok(Self { kind, body })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    pub fn id(&self) -> Option<&str> {
        str_at(&self.body, &["id"])
    }

    pub fn label(&self) -> Option<&str> {
        str_at(&self.body, &["label"])
    }
}

pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

pub fn value_at_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    path.iter().try_fold(value, |current, key| current.get_mut(*key))
}

pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    value_at(value, path).and_then(Value::as_str)
}

/// Source-org id to destination-org id, built up during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierMap(BTreeMap<String, String>);

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, destination_id: impl Into<String>) {
        self.0.insert(source_id.into(), destination_id.into());
    }

    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.0.get(source_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
