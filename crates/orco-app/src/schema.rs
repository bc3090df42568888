// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::collections::BTreeSet;

use crate::format::{format_duration, format_size, format_timestamp, size_from_value};
use crate::lifecycle::describe;
use crate::record::{Record, value_text};
use crate::table::Cell;

pub const RAW_CONFIG_COLUMN_ID: &str = "config";
const RAW_CONFIG_HEADER: &str = "Config";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    Config,
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    Field(String),
    ConfigKey(String),
    WholeConfig,
}

impl ColumnSource {
    pub fn resolve<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        match self {
            Self::Field(field) => record.get(field),
            Self::ConfigKey(key) => record.config_value(key),
            Self::WholeConfig => record.config(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// Strings verbatim, anything else as JSON text.
    ConfigItem,
    Plain,
    LifecycleState,
    Size,
    Duration,
    Timestamp,
    /// Falsy values render empty, everything else as JSON text.
    JsonOrEmpty,
    /// `{n_tasks, n_completed}` rendered as `completed/total`.
    TaskProgress,
}

impl CellFormat {
    pub fn render(self, value: Option<&Value>) -> Cell {
        match self {
            Self::ConfigItem => value.map_or(Cell::Empty, |value| Cell::Text(value_text(value))),
            Self::Plain => match value {
                None | Some(Value::Null) => Cell::Empty,
                Some(value) => Cell::Text(value_text(value)),
            },
            Self::LifecycleState => {
                Cell::State(describe(value.and_then(Value::as_str).unwrap_or("?")))
            }
            Self::Size => value
                .and_then(size_from_value)
                .map_or(Cell::Empty, |bytes| Cell::Text(format_size(bytes))),
            Self::Duration => value
                .and_then(Value::as_f64)
                .map_or(Cell::Empty, |seconds| Cell::Text(format_duration(seconds))),
            Self::Timestamp => match value.map(format_timestamp) {
                Some(text) if !text.is_empty() => Cell::Text(text),
                _ => Cell::Empty,
            },
            Self::JsonOrEmpty => match value {
                Some(value) if !is_falsy(value) => Cell::Text(value.to_string()),
                _ => Cell::Empty,
            },
            Self::TaskProgress => {
                let total = value
                    .and_then(|stats| stats.get("n_tasks"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                if total == 0 {
                    return Cell::Empty;
                }
                let completed = value
                    .and_then(|stats| stats.get("n_completed"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                Cell::Text(format!("{completed}/{total}"))
            }
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub id: String,
    pub header: String,
    pub source: ColumnSource,
    pub format: CellFormat,
    pub group: ColumnGroup,
}

impl ColumnSpec {
    pub fn metadata(id: &str, header: &str, field: &str, format: CellFormat) -> Self {
        Self {
            id: id.to_owned(),
            header: header.to_owned(),
            source: ColumnSource::Field(field.to_owned()),
            format,
            group: ColumnGroup::Metadata,
        }
    }

    fn config_key(index: usize, key: &str) -> Self {
        Self {
            id: format!("config_{index}"),
            header: key.to_owned(),
            source: ColumnSource::ConfigKey(key.to_owned()),
            format: CellFormat::ConfigItem,
            group: ColumnGroup::Config,
        }
    }

    fn raw_config() -> Self {
        Self {
            id: RAW_CONFIG_COLUMN_ID.to_owned(),
            header: RAW_CONFIG_HEADER.to_owned(),
            source: ColumnSource::WholeConfig,
            format: CellFormat::ConfigItem,
            group: ColumnGroup::Config,
        }
    }

    pub fn cell(&self, record: &Record) -> Cell {
        self.format.render(self.source.resolve(record))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    Inferred,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailField {
    pub field: &'static str,
    pub header: &'static str,
}

/// Static per-view part of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTemplate {
    pub config: ConfigMode,
    pub metadata: Vec<ColumnSpec>,
    pub detail_field: Option<DetailField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, id: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn config_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.group(ColumnGroup::Config)
    }

    pub fn metadata_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.group(ColumnGroup::Metadata)
    }

    pub fn has_raw_config_column(&self) -> bool {
        self.config_columns()
            .any(|column| column.source == ColumnSource::WholeConfig)
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.header.as_str())
            .collect()
    }

    fn group(&self, group: ColumnGroup) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(move |column| column.group == group)
    }
}

pub fn infer_schema(template: &ViewTemplate, records: &[Record]) -> Schema {
    let mut columns = match template.config {
        ConfigMode::Inferred => infer_config_columns(records),
        ConfigMode::Absent => Vec::new(),
    };
    columns.extend(template.metadata.iter().cloned());
    Schema::new(columns)
}

/// One column per distinct config key in first-seen order, with a whole-config
/// column in front when any record's config is not an object.
pub fn infer_config_columns(records: &[Record]) -> Vec<ColumnSpec> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    let mut has_non_object_config = false;

    for record in records {
        match record.config_object() {
            Some(config) => {
                for key in config.keys() {
                    if seen.insert(key.as_str()) {
                        keys.push(key.as_str());
                    }
                }
            }
            None => has_non_object_config = true,
        }
    }

    let mut columns = Vec::with_capacity(keys.len() + usize::from(has_non_object_config));
    if has_non_object_config {
        columns.push(ColumnSpec::raw_config());
    }
    columns.extend(
        keys.iter()
            .enumerate()
            .map(|(index, key)| ColumnSpec::config_key(index, key)),
    );
    columns
}
