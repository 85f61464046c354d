//! Append-only output tables.
//!
//! Each committed event appends one row to every [`OutputTable`]. Sinks only
//! see column values; [`TableSchema`] fixes the column names and kinds.

pub mod csv;
pub mod serialization;

pub use csv::CsvTableWriter;

use crate::aggregation::EventRows;
use crate::domain::{CaloError, CaloResult, OutputTable};
use serialization::format_table_value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue {
    Double(f64),
    Int(i64),
}

impl ColumnValue {
    pub const fn kind(self) -> ColumnKind {
        match self {
            Self::Double(_) => ColumnKind::Double,
            Self::Int(_) => ColumnKind::Int,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Double(value) => value,
            Self::Int(value) => value as f64,
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Double(value) => f.write_str(&format_table_value(*value)),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Double,
    Int,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: OutputTable,
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// `channel_0000` .. `channel_NNNN` followed by the integer `any_hit`
    /// flag. Channel names are zero-padded to the width of the last index.
    pub fn channel_energy(total_elements: usize) -> Self {
        let digits = total_elements.saturating_sub(1).to_string().len().max(4);
        let mut columns = (0..total_elements)
            .map(|index| {
                ColumnSpec::new(
                    format!("channel_{index:0digits$}", digits = digits),
                    ColumnKind::Double,
                )
            })
            .collect::<Vec<_>>();
        columns.push(ColumnSpec::new("any_hit", ColumnKind::Int));
        Self {
            table: OutputTable::ChannelEnergy,
            columns,
        }
    }

    pub fn summary() -> Self {
        Self {
            table: OutputTable::Summary,
            columns: [
                "aux_total_energy",
                "aux_x",
                "aux_y",
                "calorimeter_total_energy",
            ]
            .into_iter()
            .map(|name| ColumnSpec::new(name, ColumnKind::Double))
            .collect(),
        }
    }

    pub fn for_table(table: OutputTable, total_elements: usize) -> Self {
        match table {
            OutputTable::ChannelEnergy => Self::channel_energy(total_elements),
            OutputTable::Summary => Self::summary(),
        }
    }

    pub fn table(&self) -> OutputTable {
        self.table
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn header_line(&self) -> String {
        self.column_names().collect::<Vec<_>>().join(",")
    }

    pub fn check_row(&self, values: &[ColumnValue]) -> CaloResult<()> {
        if values.len() != self.width() {
            return Err(CaloError::internal(
                "RUN.TABLE_WIDTH",
                format!(
                    "table '{}' expects {} columns, row has {}",
                    self.table,
                    self.width(),
                    values.len()
                ),
            ));
        }

        if let Some((column, value)) = self
            .columns
            .iter()
            .zip(values)
            .find(|(column, value)| column.kind != value.kind())
        {
            return Err(CaloError::internal(
                "RUN.TABLE_KIND",
                format!(
                    "table '{}' column '{}' expects {:?}, got {:?}",
                    self.table, column.name, column.kind, value
                ),
            ));
        }

        Ok(())
    }
}

/// Destination for committed rows: fill one table's row and close it.
pub trait TableSink {
    fn append_row(&mut self, table: OutputTable, values: &[ColumnValue]) -> CaloResult<()>;

    fn flush(&mut self) -> CaloResult<()> {
        Ok(())
    }
}

impl<T: TableSink + ?Sized> TableSink for &mut T {
    fn append_row(&mut self, table: OutputTable, values: &[ColumnValue]) -> CaloResult<()> {
        (**self).append_row(table, values)
    }

    fn flush(&mut self) -> CaloResult<()> {
        (**self).flush()
    }
}

/// Appends the channel row and then the summary row of one event.
pub fn append_event_rows<S: TableSink + ?Sized>(sink: &mut S, rows: &EventRows) -> CaloResult<()> {
    sink.append_row(OutputTable::ChannelEnergy, &rows.channel.column_values())?;
    sink.append_row(OutputTable::Summary, &rows.summary.column_values())
}

/// In-process sink that keeps every row for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTables {
    schemas: BTreeMap<usize, TableSchema>,
    rows: BTreeMap<usize, Vec<Vec<ColumnValue>>>,
}

impl MemoryTables {
    pub fn new(total_elements: usize) -> Self {
        let schemas = OutputTable::ALL
            .into_iter()
            .map(|table| (table.id(), TableSchema::for_table(table, total_elements)))
            .collect();
        Self {
            schemas,
            rows: BTreeMap::new(),
        }
    }

    pub fn schema(&self, table: OutputTable) -> Option<&TableSchema> {
        self.schemas.get(&table.id())
    }

    pub fn rows(&self, table: OutputTable) -> &[Vec<ColumnValue>] {
        self.rows
            .get(&table.id())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: OutputTable) -> usize {
        self.rows(table).len()
    }
}

impl TableSink for MemoryTables {
    fn append_row(&mut self, table: OutputTable, values: &[ColumnValue]) -> CaloResult<()> {
        let schema = self.schemas.get(&table.id()).ok_or_else(|| {
            CaloError::internal("RUN.TABLE_UNKNOWN", format!("no schema for table '{table}'"))
        })?;
        schema.check_row(values)?;
        self.rows.entry(table.id()).or_default().push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnKind, ColumnValue, MemoryTables, TableSchema, TableSink, append_event_rows};
    use crate::aggregation::EventAggregator;
    use crate::domain::{CaloErrorCategory, OutputTable};

    #[test]
    fn channel_schema_names_every_column() {
        let schema = TableSchema::channel_energy(1225);
        assert_eq!(schema.width(), 1226);
        let names = schema.column_names().collect::<Vec<_>>();
        assert_eq!(names[0], "channel_0000");
        assert_eq!(names[1224], "channel_1224");
        assert_eq!(names[1225], "any_hit");
        assert_eq!(schema.columns()[1225].kind, ColumnKind::Int);

        let small = TableSchema::channel_energy(9);
        assert_eq!(small.header_line(), "channel_0000,channel_0001,channel_0002,channel_0003,channel_0004,channel_0005,channel_0006,channel_0007,channel_0008,any_hit");
    }

    #[test]
    fn summary_schema_matches_row_order() {
        assert_eq!(
            TableSchema::summary().header_line(),
            "aux_total_energy,aux_x,aux_y,calorimeter_total_energy"
        );
    }

    #[test]
    fn mismatched_rows_are_internal_errors() {
        let mut tables = MemoryTables::new(4);
        let error = tables
            .append_row(OutputTable::Summary, &[ColumnValue::Double(1.0)])
            .expect_err("short row");
        assert_eq!(error.category(), CaloErrorCategory::InternalError);
        assert_eq!(error.placeholder(), "RUN.TABLE_WIDTH");

        let error = tables
            .append_row(
                OutputTable::Summary,
                &[
                    ColumnValue::Double(1.0),
                    ColumnValue::Double(1.0),
                    ColumnValue::Int(1),
                    ColumnValue::Double(1.0),
                ],
            )
            .expect_err("wrong kind");
        assert_eq!(error.placeholder(), "RUN.TABLE_KIND");
        assert_eq!(tables.row_count(OutputTable::Summary), 0);
    }

    #[test]
    fn committed_rows_land_in_both_tables_in_order() {
        let mut aggregator = EventAggregator::new(4);
        let mut tables = MemoryTables::new(4);

        for energy in [1.0, 2.0, 3.0] {
            aggregator.begin_event().expect("begin");
            aggregator.record_channel_hit(2, energy).expect("hit");
            let rows = aggregator.commit_event().expect("commit");
            append_event_rows(&mut tables, &rows).expect("append");
        }

        assert_eq!(tables.row_count(OutputTable::ChannelEnergy), 3);
        assert_eq!(tables.row_count(OutputTable::Summary), 3);
        let totals = tables
            .rows(OutputTable::Summary)
            .iter()
            .map(|row| row[3].as_f64())
            .collect::<Vec<_>>();
        assert_eq!(totals, vec![1.0, 2.0, 3.0]);
        assert_eq!(tables.rows(OutputTable::ChannelEnergy)[0][4], ColumnValue::Int(1));
    }

    #[test]
    fn column_values_render_for_text_tables() {
        assert_eq!(ColumnValue::Double(7.0).to_string(), "7");
        assert_eq!(ColumnValue::Double(-0.0).to_string(), "0");
        assert_eq!(ColumnValue::Double(3.2).to_string(), "3.2");
        assert_eq!(ColumnValue::Int(1).to_string(), "1");
    }
}
