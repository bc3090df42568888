// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;

use crate::lifecycle::StateDescriptor;
use crate::record::{Record, value_text};
use crate::schema::{DetailField, Schema, ViewTemplate, infer_schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    State(StateDescriptor),
}

impl Cell {
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::State(descriptor) => format!("{} {}", descriptor.icon.glyph(), descriptor.label),
        }
    }

    pub fn state(&self) -> Option<StateDescriptor> {
        match self {
            Self::State(descriptor) => Some(*descriptor),
            _ => None,
        }
    }
}

/// Exact match on one top-level field, compared against its text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub field: String,
    pub value: String,
}

impl RowFilter {
    pub fn new(field: &str, value: &str) -> Self {
        Self {
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .text(&self.field)
            .is_some_and(|text| text == self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableRow {
    /// Position of the record in the unfiltered batch.
    pub index: usize,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailItem {
    pub header: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDetail {
    /// Pretty-printed `config`, absent when the record has none.
    pub config: Option<String>,
    pub items: Vec<DetailItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    records: Vec<Record>,
    schema: Schema,
    detail_field: Option<DetailField>,
    filter: Option<RowFilter>,
}

impl RecordTable {
    pub fn new(records: Vec<Record>, schema: Schema, detail_field: Option<DetailField>) -> Self {
        Self {
            records,
            schema,
            detail_field,
            filter: None,
        }
    }

    /// Infers the schema for `records` from the view template.
    pub fn build(template: &ViewTemplate, records: Vec<Record>) -> Self {
        let schema = infer_schema(template, &records);
        Self::new(records, schema, template.detail_field)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn filter(&self) -> Option<&RowFilter> {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Option<RowFilter>) {
        self.filter = filter;
    }

    fn visible(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.filter.as_ref().is_none_or(|filter| filter.matches(record)))
    }

    pub fn row_count(&self) -> usize {
        self.visible().count()
    }

    pub fn rows(&self) -> Vec<RenderableRow> {
        self.visible()
            .map(|(index, record)| RenderableRow {
                index,
                cells: self
                    .schema
                    .columns()
                    .iter()
                    .map(|column| column.cell(record))
                    .collect(),
            })
            .collect()
    }

    /// Raw config plus the designated detail field of the record at `index`
    /// in the unfiltered batch.
    pub fn expand(&self, index: usize) -> Option<RowDetail> {
        let record = self.records.get(index)?;
        let config = record
            .config()
            .filter(|config| !config.is_null())
            .map(pretty_json);
        let items = self
            .detail_field
            .and_then(|detail| {
                record.get(detail.field).map(|value| DetailItem {
                    header: detail.header.to_owned(),
                    value: value_text(value),
                })
            })
            .into_iter()
            .collect();
        Some(RowDetail { config, items })
    }

    pub fn render_text(&self) -> String {
        if self.schema.is_empty() {
            return "(no columns)\n".to_owned();
        }
        let rows = self.rows();
        if rows.is_empty() {
            return "(no rows)\n".to_owned();
        }

        let headers = self.schema.headers();
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.cells.iter().map(Cell::display).collect())
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|text| text.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        push_text_row(&mut out, headers.iter().copied(), &widths);
        for row in &cells {
            push_text_row(&mut out, row.iter().map(String::as_str), &widths);
        }
        out
    }
}

fn push_text_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(text, &width)| format!("{text:<width$}"))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Cell, RecordTable, RowFilter};
    use crate::record::Record;
    use crate::schema::{CellFormat, ColumnSpec, ConfigMode, DetailField, Schema, ViewTemplate};
    use serde_json::{Value, json};

    fn template() -> ViewTemplate {
        ViewTemplate {
            config: ConfigMode::Inferred,
            metadata: vec![
                ColumnSpec::metadata("state", "S", "state", CellFormat::LifecycleState),
                ColumnSpec::metadata("size", "Size", "size", CellFormat::Size),
            ],
            detail_field: Some(DetailField {
                field: "key",
                header: "Key",
            }),
        }
    }

    fn batch(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(Record::from_value).collect()
    }

    fn sample_table() -> RecordTable {
        RecordTable::build(
            &template(),
            batch(vec![
                json!({"key": "k1", "state": "f", "size": 10, "config": {"n": 1}}),
                json!({"key": "k2", "state": "e", "size": 20, "config": {"n": 2}}),
                json!({"key": "k3", "state": "f", "size": 30, "config": {"n": 3}}),
            ]),
        )
    }

    #[test]
    fn rows_follow_schema_column_order() {
        let table = sample_table();
        let rows = table.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(table.schema().headers(), vec!["n", "S", "Size"]);
        assert_eq!(rows[1].cells[0], Cell::Text("2".to_owned()));
        assert_eq!(rows[1].cells[1].state().map(|state| state.label), Some("errored"));
        assert_eq!(rows[1].cells[2], Cell::Text("20 B".to_owned()));
    }

    #[test]
    fn explicit_schema_drives_rows_and_detail() {
        let schema = Schema::new(vec![ColumnSpec::metadata(
            "size",
            "Size",
            "size",
            CellFormat::Size,
        )]);
        let detail_field = Some(DetailField {
            field: "key",
            header: "Key",
        });
        let table = RecordTable::new(
            batch(vec![json!({"key": "k1", "size": 2048, "config": {"n": 1}})]),
            schema,
            detail_field,
        );

        assert_eq!(table.schema().headers(), vec!["Size"]);
        assert_eq!(table.rows()[0].cells, vec![Cell::Text("2.00 KiB".to_owned())]);
        let detail = table.expand(0).expect("row exists");
        assert_eq!(detail.items[0].value, "k1");
        assert_eq!(table.render_text(), "Size\n2.00 KiB\n");
    }

    #[test]
    fn table_without_columns_renders_placeholder() {
        let table = RecordTable::new(batch(vec![json!({"a": 1})]), Schema::default(), None);
        assert!(table.schema().is_empty());
        assert_eq!(table.render_text(), "(no columns)\n");
        assert!(table.expand(0).expect("row exists").items.is_empty());
    }

    #[test]
    fn filter_restricts_rows_without_dropping_records() {
        let mut table = sample_table();
        table.set_filter(Some(RowFilter::new("state", "f")));

        let rows = table.rows();
        assert_eq!(rows.iter().map(|row| row.index).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.records().len(), 3);

        table.set_filter(None);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn filter_never_matches_missing_field() {
        let mut table = RecordTable::build(&template(), batch(vec![json!({"config": {}})]));
        table.set_filter(Some(RowFilter::new("state", "")));
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn expand_pairs_config_with_detail_field() {
        let table = sample_table();
        let detail = table.expand(1).expect("row exists");
        assert_eq!(detail.config.as_deref(), Some("{\n  \"n\": 2\n}"));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].header, "Key");
        assert_eq!(detail.items[0].value, "k2");
        assert!(table.expand(9).is_none());
    }

    #[test]
    fn expand_without_config_or_detail_is_empty() {
        let table = RecordTable::build(&template(), batch(vec![json!({"state": "r"})]));
        let detail = table.expand(0).expect("row exists");
        assert!(detail.config.is_none());
        assert!(detail.items.is_empty());
    }

    #[test]
    fn render_text_aligns_columns() {
        let table = sample_table();
        let text = table.render_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "n | S          | Size");
        assert_eq!(lines[1], "1 | ✓ finished | 10 B");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn render_text_handles_empty_batches() {
        let table = RecordTable::build(&template(), Vec::new());
        assert_eq!(table.render_text(), "(no rows)\n");
    }
}
