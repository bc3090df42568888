// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

pub const CONFIG_FIELD: &str = "config";

/// One fetched unit of data. Field access is structural probing only; the
/// backend's shapes are never validated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Non-object batch elements degrade to an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => {
                tracing::debug!(kind = value_kind(&other), "non-object record in batch");
                Self::default()
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn config(&self) -> Option<&Value> {
        self.get(CONFIG_FIELD)
    }

    /// `None` when `config` is missing, null, a primitive or an array.
    pub fn config_object(&self) -> Option<&Map<String, Value>> {
        self.config().and_then(Value::as_object)
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config_object().and_then(|config| config.get(key))
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(value_text)
    }
}

/// Strings render verbatim, everything else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn batch_from_value(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(Record::from_value).collect()),
        other => bail!("expected a JSON array of records, got {}", value_kind(&other)),
    }
}

pub fn parse_batch(body: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(body).context("decode record batch")?;
    batch_from_value(value)
}
