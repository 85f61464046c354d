use super::CliError;
use anyhow::Context;
use calo_core::aggregation::EventHits;
use calo_core::common::config::{ApparatusConfig, load_apparatus_config};
use calo_core::domain::CaloError;
use calo_core::geometry::{GeometryLayoutBuilder, LayoutTable};
use calo_core::tables::serialization::write_text_output;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Debug, Default)]
pub(super) struct ConfigFlags {
    /// Apparatus configuration JSON (defaults to the standard apparatus)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the grid side length in cells
    #[arg(long)]
    side: Option<usize>,

    /// Override the crystal pitch in millimetres
    #[arg(long = "pitch-mm")]
    pitch_mm: Option<f64>,
}

impl ConfigFlags {
    pub(super) fn load(&self) -> Result<ApparatusConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => load_apparatus_config(path).map_err(CaloError::from)?,
            None => ApparatusConfig::default(),
        };
        if let Some(side) = self.side {
            config.side = side;
            if config.aperture_cells > side {
                // A grid narrower than the standard aperture has no aperture.
                config.aperture_cells = 0;
            }
        }
        if let Some(pitch_mm) = self.pitch_mm {
            config.element_pitch_mm = pitch_mm;
        }
        config.validate()?;
        Ok(config)
    }
}

pub(super) fn build_layout(config: &ApparatusConfig) -> Result<LayoutTable, CliError> {
    let builder = GeometryLayoutBuilder::new(config.grid()?, config.boundary_mask()?);
    Ok(builder.build())
}

pub(super) fn read_replay_events(path: &Path) -> Result<Vec<EventHits>, CliError> {
    let source = fs::read_to_string(path).map_err(|source| {
        CaloError::io_system(
            "IO.REPLAY_READ",
            format!("failed to read event stream '{}': {}", path.display(), source),
        )
    })?;

    let mut events = Vec::new();
    for (line_index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str::<EventHits>(line).map_err(|source| {
            CaloError::input_validation(
                "INPUT.REPLAY_PARSE",
                format!(
                    "event stream '{}' line {}: {}",
                    path.display(),
                    line_index + 1,
                    source
                ),
            )
        })?;
        events.push(event);
    }
    tracing::info!(events = events.len(), path = %path.display(), "event stream loaded");
    Ok(events)
}

/// Writes `content` to `output` when given, otherwise to stdout.
pub(super) fn emit_text(output: Option<&Path>, content: &str) -> Result<(), CliError> {
    match output {
        Some(path) => write_text_output(path, content).map_err(CliError::from),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write to stdout")?;
            Ok(())
        }
    }
}
