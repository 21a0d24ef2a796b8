//! Fixed-width two-line ASCII tables.
//!
//! Layout: a header row of column names, a row of dashes marking each
//! column's extent, then one row per object. Column boundaries are taken
//! from the dash runs, so values may contain no embedded whitespace.

use super::serialization::{normalize_text_artifact, write_text_artifact};
use crate::domain::{OutputArtifact, StackError, StackResult, TableResult};
use ndarray::Array1;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(values) => values.len(),
            Self::Float(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render_cell(&self, row: usize) -> String {
        match self {
            Self::Int(values) => values[row].to_string(),
            // Debug formatting is the shortest exact representation and always
            // carries a decimal point or exponent, so floats re-read as floats.
            Self::Float(values) => format!("{:?}", values[row]),
            Self::Text(values) => values[row].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |column| column.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| StackError::missing_column(name, &self.name))
    }

    /// Column values as floats; integer columns are widened.
    pub fn float_column(&self, name: &str) -> TableResult<Array1<f64>> {
        match &self.column(name)?.data {
            ColumnData::Float(values) => Ok(Array1::from(values.clone())),
            ColumnData::Int(values) => Ok(values.iter().map(|value| *value as f64).collect()),
            ColumnData::Text(_) => Err(self.non_numeric(name)),
        }
    }

    pub fn int_column(&self, name: &str) -> TableResult<Vec<i64>> {
        match &self.column(name)?.data {
            ColumnData::Int(values) => Ok(values.clone()),
            ColumnData::Float(values)
                if values.iter().all(|value| value.fract() == 0.0) =>
            {
                Ok(values.iter().map(|value| *value as i64).collect())
            }
            _ => Err(self.non_numeric(name)),
        }
    }

    /// Adds a column, replacing any existing column of the same name in place.
    pub fn put_column(&mut self, name: impl Into<String>, data: ColumnData) -> TableResult<()> {
        let name = name.into();
        if !self.columns.is_empty() && data.len() != self.len() {
            return Err(StackError::input_validation(
                "INPUT.COLUMN_LENGTH",
                format!(
                    "column '{}' has {} rows but table '{}' has {}",
                    name,
                    data.len(),
                    self.name,
                    self.len()
                ),
            ));
        }

        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.data = data,
            None => self.columns.push(Column { name, data }),
        }
        Ok(())
    }

    pub fn put_float_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> TableResult<()> {
        self.put_column(name, ColumnData::Float(values))
    }

    /// Overwrites `rows` of a numeric column with `values`; all other rows
    /// keep their exact previous values.
    pub fn set_float_rows(&mut self, name: &str, rows: &[usize], values: &[f64]) -> TableResult<()> {
        if rows.len() != values.len() {
            return Err(StackError::internal(
                "SYS.ROW_UPDATE",
                format!(
                    "{} row indices but {} values for column '{}'",
                    rows.len(),
                    values.len(),
                    name
                ),
            ));
        }
        let len = self.len();
        if let Some(row) = rows.iter().find(|row| **row >= len) {
            return Err(StackError::internal(
                "SYS.ROW_UPDATE",
                format!("row {} is outside table '{}' ({} rows)", row, self.name, len),
            ));
        }

        let mut current = self.float_column(name)?.to_vec();
        for (row, value) in rows.iter().zip(values) {
            current[*row] = *value;
        }
        self.put_float_column(name, current)
    }

    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                data: match &column.data {
                    ColumnData::Int(values) => {
                        ColumnData::Int(rows.iter().map(|row| values[*row]).collect())
                    }
                    ColumnData::Float(values) => {
                        ColumnData::Float(rows.iter().map(|row| values[*row]).collect())
                    }
                    ColumnData::Text(values) => {
                        ColumnData::Text(rows.iter().map(|row| values[*row].clone()).collect())
                    }
                },
            })
            .collect();
        Table {
            name: self.name.clone(),
            columns,
        }
    }

    pub fn parse(name: &str, source: &str) -> TableResult<Self> {
        let mut lines = source.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or_else(|| table_parse_error(name, "table is empty"))?;
        let rule = lines
            .next()
            .ok_or_else(|| table_parse_error(name, "missing dashed position line"))?;
        if rule.chars().any(|ch| ch != '-' && ch != ' ') {
            return Err(table_parse_error(
                name,
                "second line must contain only dashes and spaces",
            ));
        }

        let spans = column_spans(rule);
        let names: Vec<String> = spans
            .iter()
            .map(|span| slice_cell(header, *span).to_string())
            .collect();
        if let Some(blank) = names.iter().position(|name| name.is_empty()) {
            return Err(table_parse_error(
                name,
                format!("column {} has an empty name", blank + 1),
            ));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); spans.len()];
        for line in lines {
            for (column, span) in cells.iter_mut().zip(spans.iter()) {
                column.push(slice_cell(line, *span).to_string());
            }
        }

        let mut table = Table::new(name);
        for (column_name, raw) in names.into_iter().zip(cells) {
            table.columns.push(Column {
                name: column_name,
                data: infer_column(raw),
            });
        }
        Ok(table)
    }

    pub fn render(&self) -> String {
        let rows = self.len();
        let rendered: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|column| (0..rows).map(|row| column.data.render_cell(row)).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&rendered)
            .map(|(column, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(column.name.len()))
                    .max()
                    .unwrap_or(1)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:>width$}", column.name, width = *width))
            .collect();
        out.push_str(&header.join(" "));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        out.push_str(&rule.join(" "));
        out.push('\n');
        for row in 0..rows {
            let line: Vec<String> = rendered
                .iter()
                .zip(&widths)
                .map(|(cells, width)| format!("{:>width$}", cells[row], width = *width))
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        normalize_text_artifact(&out)
    }

    fn non_numeric(&self, name: &str) -> StackError {
        StackError::input_validation(
            "INPUT.COLUMN_TYPE",
            format!("column '{}' in table '{}' is not numeric", name, self.name),
        )
    }
}

pub fn read_table(path: &Path) -> TableResult<Table> {
    if !path.is_file() {
        return Err(StackError::missing_file(path));
    }
    tracing::info!(path = %path.display(), "Reading");
    let source = fs::read_to_string(path).map_err(|source| {
        StackError::io_system(
            "IO.TABLE_READ",
            format!("failed to read table '{}': {}", path.display(), source),
        )
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Table::parse(&name, &source)
}

/// Writes `table`; an existing file is replaced only when `overwrite` is set.
pub fn write_table(table: &Table, path: &Path, overwrite: bool) -> StackResult<OutputArtifact> {
    let exists = path.exists();
    if exists && !overwrite {
        return Err(StackError::io_system(
            "IO.TABLE_EXISTS",
            format!("refusing to replace existing table '{}'", path.display()),
        ));
    }
    if exists {
        tracing::warn!(path = %path.display(), "Overwriting");
    } else {
        tracing::info!(path = %path.display(), "Writing");
    }

    write_text_artifact(path, &table.render(), "IO.TABLE_WRITE")?;
    Ok(OutputArtifact::new(path, exists))
}

fn column_spans(rule: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (index, ch) in rule.char_indices() {
        match (ch, start) {
            ('-', None) => start = Some(index),
            (' ', Some(begin)) => {
                spans.push((begin, index));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push((begin, rule.len()));
    }
    spans
}

fn slice_cell(line: &str, (start, end): (usize, usize)) -> &str {
    let end = end.min(line.len());
    line.get(start.min(end)..end).unwrap_or("").trim()
}

fn infer_column(raw: Vec<String>) -> ColumnData {
    let filled = raw.iter().filter(|cell| !cell.is_empty());
    if raw.iter().all(|cell| !cell.is_empty())
        && raw.iter().all(|cell| cell.parse::<i64>().is_ok())
    {
        return ColumnData::Int(raw.iter().filter_map(|cell| cell.parse().ok()).collect());
    }
    if filled.clone().all(|cell| cell.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            raw.iter()
                .map(|cell| cell.parse::<f64>().unwrap_or(f64::NAN))
                .collect(),
        );
    }
    ColumnData::Text(raw)
}

fn table_parse_error(name: &str, message: impl Into<String>) -> StackError {
    StackError::input_validation(
        "INPUT.TABLE_PARSE",
        format!("table '{}': {}", name, message.into()),
    )
}

#[cfg(test)]
mod tests {
    use super::{ColumnData, Table, read_table, write_table};
    use crate::domain::StackErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    fn sample_table() -> Table {
        let mut table = Table::new("sample.tbl");
        table
            .put_column("bin_ID", ColumnData::Int(vec![1, 2, 3]))
            .expect("first column");
        table
            .put_float_column("HBETA_Flux_Gaussian", vec![50.0, 1.0e-17, f64::NAN])
            .expect("float column");
        table
            .put_column(
                "label",
                ColumnData::Text(vec!["a".into(), "bb".into(), "ccc".into()]),
            )
            .expect("text column");
        table
    }

    #[test]
    fn rendered_table_uses_two_line_header() {
        let rendered = sample_table().render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("bin_ID"));
        assert!(lines[1].chars().all(|ch| ch == '-' || ch == ' '));
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[test]
    fn parse_recovers_types_and_exact_values() {
        let table = sample_table();
        let parsed = Table::parse("sample.tbl", &table.render()).expect("table should parse");

        assert_eq!(parsed.column_names(), vec!["bin_ID", "HBETA_Flux_Gaussian", "label"]);
        assert_eq!(parsed.int_column("bin_ID").expect("ids"), vec![1, 2, 3]);
        let flux = parsed.float_column("HBETA_Flux_Gaussian").expect("flux");
        assert_eq!(flux[0].to_bits(), 50.0f64.to_bits());
        assert_eq!(flux[1].to_bits(), 1.0e-17f64.to_bits());
        assert!(flux[2].is_nan());
        assert!(matches!(parsed.column("label").expect("label").data, ColumnData::Text(_)));
    }

    #[test]
    fn set_float_rows_touches_only_listed_rows() {
        let mut table = sample_table();
        table
            .set_float_rows("bin_ID", &[1], &[20.5])
            .expect("update should succeed");
        let ids = table.float_column("bin_ID").expect("ids");
        assert_eq!(ids.to_vec()[..2], [1.0, 20.5]);
        assert_eq!(ids[2], 3.0);

        assert!(table.set_float_rows("label", &[0], &[1.0]).is_err());
        assert!(table.set_float_rows("bin_ID", &[9], &[1.0]).is_err());
    }

    #[test]
    fn select_rows_keeps_order() {
        let subset = sample_table().select_rows(&[2, 0]);
        assert_eq!(subset.int_column("bin_ID").expect("ids"), vec![3, 1]);
    }

    #[test]
    fn column_length_mismatch_is_rejected() {
        let mut table = sample_table();
        let error = table
            .put_float_column("short", vec![1.0])
            .expect_err("length mismatch should fail");
        assert_eq!(error.placeholder(), "INPUT.COLUMN_LENGTH");
    }

    #[test]
    fn missing_table_is_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_table(&temp.path().join("absent.tbl")).expect_err("missing file");
        assert_eq!(error.category(), StackErrorCategory::IoSystemError);
        assert!(error.message().contains("absent.tbl"));
    }

    #[test]
    fn write_then_read_round_trips_and_reports_overwrite() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("out/sample.tbl");

        let first = write_table(&sample_table(), &path, true).expect("first write");
        assert!(!first.overwritten);
        let second = write_table(&sample_table(), &path, true).expect("second write");
        assert!(second.overwritten);
        assert!(write_table(&sample_table(), &path, false).is_err());

        let parsed = read_table(&path).expect("table should be readable");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.name(), "sample.tbl");
        assert!(fs::read_to_string(&path).expect("readable").ends_with('\n'));
    }

    #[test]
    fn header_without_rule_is_rejected() {
        let error = Table::parse("bad.tbl", "a b\n1 2\n").expect_err("rule line required");
        assert_eq!(error.placeholder(), "INPUT.TABLE_PARSE");
    }
}
