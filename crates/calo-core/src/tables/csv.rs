use super::{ColumnValue, TableSchema, TableSink};
use crate::domain::{CaloError, CaloResult, OutputTable};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct CsvTable {
    schema: TableSchema,
    path: PathBuf,
    writer: BufWriter<File>,
    rows_written: usize,
}

impl CsvTable {
    fn create(dir: &Path, schema: TableSchema) -> CaloResult<Self> {
        let path = dir.join(schema.table().file_name());
        let file = File::create(&path).map_err(|source| table_write_error(&path, source))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", schema.header_line())
            .map_err(|source| table_write_error(&path, source))?;
        Ok(Self {
            schema,
            path,
            writer,
            rows_written: 0,
        })
    }

    fn append(&mut self, values: &[ColumnValue]) -> CaloResult<()> {
        self.schema.check_row(values)?;
        let line = values
            .iter()
            .map(ColumnValue::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.writer, "{line}").map_err(|source| table_write_error(&self.path, source))?;
        self.rows_written += 1;
        Ok(())
    }
}

/// Writes `channel_energy.csv` and `summary.csv` into one directory.
///
/// Rows are buffered; call [`TableSink::flush`] before dropping the writer so
/// write failures surface as errors.
pub struct CsvTableWriter {
    tables: [CsvTable; 2],
}

impl CsvTableWriter {
    pub fn create(output_dir: impl AsRef<Path>, total_elements: usize) -> CaloResult<Self> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).map_err(|source| {
            CaloError::io_system(
                "IO.TABLE_DIR",
                format!(
                    "failed to create table directory '{}': {}",
                    output_dir.display(),
                    source
                ),
            )
        })?;

        Ok(Self {
            tables: [
                CsvTable::create(output_dir, TableSchema::channel_energy(total_elements))?,
                CsvTable::create(output_dir, TableSchema::summary())?,
            ],
        })
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.tables.iter().map(|table| table.path.clone()).collect()
    }

    pub fn rows_written(&self, table: OutputTable) -> usize {
        self.tables[table.id()].rows_written
    }
}

impl TableSink for CsvTableWriter {
    fn append_row(&mut self, table: OutputTable, values: &[ColumnValue]) -> CaloResult<()> {
        self.tables[table.id()].append(values)
    }

    fn flush(&mut self) -> CaloResult<()> {
        for table in &mut self.tables {
            table
                .writer
                .flush()
                .map_err(|source| table_write_error(&table.path, source))?;
            tracing::info!(
                table = %table.schema.table(),
                rows = table.rows_written,
                path = %table.path.display(),
                "table flushed"
            );
        }
        Ok(())
    }
}

fn table_write_error(path: &Path, source: std::io::Error) -> CaloError {
    CaloError::io_system(
        "IO.TABLE_WRITE",
        format!("failed to write table '{}': {}", path.display(), source),
    )
}
