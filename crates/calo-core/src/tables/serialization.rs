//! Text rendering shared by the output tables and the CLI reports.

use crate::domain::{CaloError, CaloResult};
use std::fs;
use std::path::Path;

/// Shortest text that parses back to the same `f64`; negative zero is
/// written as `0`.
pub fn format_table_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// A length in a right-aligned report column, to a tenth of a millimetre.
pub fn format_millimetres(value: f64) -> String {
    format!("{value:>9.1}")
}

/// Densities in g/cm3. Values too small for four decimals switch to
/// scientific notation.
pub fn format_density(value: f64) -> String {
    if value != 0.0 && value.abs() < 1.0e-3 {
        format!("{value:.3e}")
    } else {
        format!("{value:.4}")
    }
}

/// Writes a report or placement listing, creating missing parent
/// directories. The file always ends with a newline.
pub fn write_text_output(path: &Path, content: &str) -> CaloResult<()> {
    let write_error = |source: std::io::Error| {
        CaloError::io_system(
            "IO.CLI_OUTPUT",
            format!("failed to write '{}': {}", path.display(), source),
        )
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    if content.is_empty() || content.ends_with('\n') {
        fs::write(path, content).map_err(write_error)
    } else {
        fs::write(path, format!("{content}\n")).map_err(write_error)
    }
}
