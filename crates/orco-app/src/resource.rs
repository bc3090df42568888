// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};

use crate::record::Record;
use crate::schema::{CellFormat, ColumnSpec, ConfigMode, DetailField, ViewTemplate};

/// The REST collections the dashboard reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Builders,
    Collections,
    Jobs(String),
    Entries(String),
    Executors,
    Reports,
}

impl Resource {
    pub fn path(&self) -> String {
        match self {
            Self::Builders => "builders".to_owned(),
            Self::Collections => "collections".to_owned(),
            Self::Jobs(name) => format!("jobs/{name}"),
            Self::Entries(name) => format!("entries/{name}"),
            Self::Executors => "executors".to_owned(),
            Self::Reports => "reports".to_owned(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().trim_matches('/');
        let (head, name) = match raw.split_once('/') {
            Some((head, name)) => (head, Some(name)),
            None => (raw, None),
        };

        let named = |build: fn(String) -> Self| -> Result<Self> {
            match name {
                Some(name) if !name.is_empty() && !name.contains('/') => Ok(build(name.to_owned())),
                _ => Err(anyhow!("resource {raw:?} needs a single name, e.g. {head}/<name>")),
            }
        };

        match (head, name) {
            ("builders", None) => Ok(Self::Builders),
            ("collections", None) => Ok(Self::Collections),
            ("executors", None) => Ok(Self::Executors),
            ("reports", None) => Ok(Self::Reports),
            ("jobs", _) => named(Self::Jobs),
            ("entries", _) => named(Self::Entries),
            _ => bail!(
                "unknown resource {raw:?}; expected builders, collections, jobs/<name>, entries/<name>, executors, or reports"
            ),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Builders => "builders".to_owned(),
            Self::Collections => "collections".to_owned(),
            Self::Jobs(name) => format!("builder '{name}'"),
            Self::Entries(name) => format!("collection '{name}'"),
            Self::Executors => "executors".to_owned(),
            Self::Reports => "reports".to_owned(),
        }
    }

    pub const fn supports_state_filter(&self) -> bool {
        matches!(self, Self::Jobs(_) | Self::Entries(_))
    }

    /// Builder and collection rows open the matching job/entry list.
    pub fn drill_target(&self, record: &Record) -> Option<Self> {
        let name = record.get("name").and_then(|value| value.as_str())?;
        if name.is_empty() {
            return None;
        }
        match self {
            Self::Builders => Some(Self::Jobs(name.to_owned())),
            Self::Collections => Some(Self::Entries(name.to_owned())),
            _ => None,
        }
    }

    pub fn template(&self) -> ViewTemplate {
        match self {
            Self::Builders => ViewTemplate {
                config: ConfigMode::Absent,
                metadata: vec![
                    ColumnSpec::metadata("name", "Builder name", "name", CellFormat::Plain),
                    ColumnSpec::metadata("n_finished", "Finished", "n_finished", CellFormat::Plain),
                    ColumnSpec::metadata(
                        "n_in_progress",
                        "In progress",
                        "n_in_progress",
                        CellFormat::Plain,
                    ),
                    ColumnSpec::metadata("n_failed", "Failed", "n_failed", CellFormat::Plain),
                    ColumnSpec::metadata("size", "Total Size", "size", CellFormat::Size),
                ],
                detail_field: None,
            },
            Self::Collections => ViewTemplate {
                config: ConfigMode::Absent,
                metadata: vec![
                    ColumnSpec::metadata("name", "Collection name", "name", CellFormat::Plain),
                    ColumnSpec::metadata("count", "Entries", "count", CellFormat::Plain),
                    ColumnSpec::metadata("size", "Size", "size", CellFormat::Size),
                ],
                detail_field: None,
            },
            Self::Jobs(_) => ViewTemplate {
                config: ConfigMode::Inferred,
                metadata: vec![
                    ColumnSpec::metadata("state", "S", "state", CellFormat::LifecycleState),
                    ColumnSpec::metadata("size", "Size", "size", CellFormat::Size),
                    ColumnSpec::metadata("comptime", "CompTime", "comp_time", CellFormat::Duration),
                    ColumnSpec::metadata(
                        "timestamp",
                        "Finished time",
                        "finished",
                        CellFormat::Timestamp,
                    ),
                ],
                detail_field: Some(DetailField {
                    field: "key",
                    header: "Key",
                }),
            },
            Self::Entries(_) => ViewTemplate {
                config: ConfigMode::Inferred,
                metadata: vec![
                    ColumnSpec::metadata("state", "S", "state", CellFormat::LifecycleState),
                    ColumnSpec::metadata("size", "Size", "size", CellFormat::Size),
                    ColumnSpec::metadata("comptime", "CompTime", "comp_time", CellFormat::Duration),
                    ColumnSpec::metadata("created", "Created", "created", CellFormat::Timestamp),
                ],
                detail_field: Some(DetailField {
                    field: "key",
                    header: "Key",
                }),
            },
            Self::Executors => ViewTemplate {
                config: ConfigMode::Absent,
                metadata: vec![
                    ColumnSpec::metadata("status", "Status", "status", CellFormat::Plain),
                    ColumnSpec::metadata("id", "Id", "id", CellFormat::Plain),
                    ColumnSpec::metadata("type", "Type", "type", CellFormat::Plain),
                    ColumnSpec::metadata("version", "Version", "version", CellFormat::Plain),
                    ColumnSpec::metadata("resources", "Resources", "resources", CellFormat::Plain),
                    ColumnSpec::metadata("stats", "Tasks", "stats", CellFormat::TaskProgress),
                ],
                detail_field: None,
            },
            Self::Reports => ViewTemplate {
                config: ConfigMode::Absent,
                metadata: vec![
                    ColumnSpec::metadata(
                        "timestamp",
                        "Timestamp",
                        "timestamp",
                        CellFormat::Timestamp,
                    ),
                    ColumnSpec::metadata("type", "Type", "type", CellFormat::Plain),
                    ColumnSpec::metadata("message", "Message", "message", CellFormat::Plain),
                    ColumnSpec::metadata("executor", "Executor", "executor", CellFormat::Plain),
                    ColumnSpec::metadata(
                        "collection",
                        "Collection",
                        "collection",
                        CellFormat::Plain,
                    ),
                    ColumnSpec::metadata(
                        "report_config",
                        "Config",
                        "config",
                        CellFormat::JsonOrEmpty,
                    ),
                ],
                detail_field: Some(DetailField {
                    field: "message",
                    header: "Message",
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Resource;
    use crate::record::Record;
    use anyhow::Result;
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn parse_accepts_every_path_form() -> Result<()> {
        for resource in [
            Resource::Builders,
            Resource::Collections,
            Resource::Jobs("buildX".to_owned()),
            Resource::Entries("col".to_owned()),
            Resource::Executors,
            Resource::Reports,
        ] {
            assert_eq!(Resource::parse(&resource.path())?, resource);
        }
        assert_eq!(Resource::parse("/jobs/a/")?, Resource::Jobs("a".to_owned()));
        Ok(())
    }

    #[test]
    fn parse_rejects_unknown_and_unnamed_resources() {
        let error = Resource::parse("status").expect_err("status is not a list resource");
        assert!(error.to_string().contains("unknown resource"));

        let error = Resource::parse("jobs").expect_err("jobs needs a name");
        assert!(error.to_string().contains("jobs/<name>"));

        assert!(Resource::parse("jobs/a/b").is_err());
        assert!(Resource::parse("builders/extra").is_err());
    }

    #[test]
    fn drill_targets_follow_names() {
        let record = Record::from_value(json!({"name": "train"}));
        assert_eq!(
            Resource::Builders.drill_target(&record),
            Some(Resource::Jobs("train".to_owned()))
        );
        assert_eq!(
            Resource::Collections.drill_target(&record),
            Some(Resource::Entries("train".to_owned()))
        );
        assert_eq!(Resource::Reports.drill_target(&record), None);
        assert_eq!(
            Resource::Builders.drill_target(&Record::from_value(json!({"name": 3}))),
            None
        );
    }

    #[test]
    fn template_column_ids_are_unique() {
        for resource in [
            Resource::Builders,
            Resource::Collections,
            Resource::Jobs("x".to_owned()),
            Resource::Entries("x".to_owned()),
            Resource::Executors,
            Resource::Reports,
        ] {
            let template = resource.template();
            let ids: BTreeSet<_> = template.metadata.iter().map(|column| &column.id).collect();
            assert_eq!(ids.len(), template.metadata.len(), "{}", resource.path());
            assert!(!ids.iter().any(|id| id.starts_with("config")));
        }
    }
}
