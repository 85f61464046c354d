use super::CliError;
use super::helpers::{ConfigFlags, build_layout, emit_text, read_replay_events};
use anyhow::Context;
use calo_core::aggregation::{EventOutcome, EventPipeline, aggregate_in_workers};
use calo_core::common::materials::Material;
use calo_core::domain::OutputTable;
use calo_core::geometry::{ApparatusLayout, BoxFrame};
use calo_core::tables::serialization::{format_density, format_millimetres, format_table_value};
use calo_core::tables::{CsvTableWriter, TableSink, append_event_rows};
use std::path::PathBuf;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum LayoutFormat {
    #[default]
    Csv,
    Json,
}

#[derive(clap::Args)]
pub(super) struct LayoutArgs {
    #[command(flatten)]
    config: ConfigFlags,

    /// List every grid cell with its inclusion flag instead of placements only
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = LayoutFormat::Csv)]
    format: LayoutFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct DescribeArgs {
    #[command(flatten)]
    config: ConfigFlags,
}

#[derive(clap::Args)]
pub(super) struct ReplayArgs {
    /// Event stream, one JSON object per line
    #[arg(long)]
    events: PathBuf,

    /// Directory receiving channel_energy.csv and summary.csv
    #[arg(long)]
    output_dir: PathBuf,

    #[command(flatten)]
    config: ConfigFlags,

    /// Number of aggregation workers
    #[arg(long, default_value_t = 1)]
    workers: usize,
}

pub(super) fn run_layout_command(args: LayoutArgs) -> Result<i32, CliError> {
    let config = args.config.load()?;
    let layout = build_layout(&config)?;

    let content = match (args.format, args.all) {
        (LayoutFormat::Csv, false) => {
            let mut content = String::from("index,x,y\n");
            for placement in layout.placements() {
                content.push_str(&format!(
                    "{},{},{}\n",
                    placement.index,
                    format_table_value(placement.x),
                    format_table_value(placement.y),
                ));
            }
            content
        }
        (LayoutFormat::Csv, true) => {
            let mut content = String::from("index,row,col,x,y,included\n");
            for entry in layout.entries() {
                content.push_str(&format!(
                    "{},{},{},{},{},{}\n",
                    entry.index,
                    entry.row,
                    entry.col,
                    format_table_value(entry.x),
                    format_table_value(entry.y),
                    u8::from(entry.included),
                ));
            }
            content
        }
        (LayoutFormat::Json, false) => serde_json::to_string_pretty(&layout.placements())
            .context("failed to serialize placements")?,
        (LayoutFormat::Json, true) => serde_json::to_string_pretty(layout.entries())
            .context("failed to serialize layout entries")?,
    };

    emit_text(args.output.as_deref(), &content)?;
    Ok(0)
}

pub(super) fn run_describe_command(args: DescribeArgs) -> Result<i32, CliError> {
    let config = args.config.load()?;
    let apparatus = ApparatusLayout::build(&config)?;
    let grid = apparatus.layout.grid();

    let mut out = String::new();
    out.push_str("Calorimeter grid\n");
    out.push_str(&format!("  side            {:>9}\n", grid.side()));
    out.push_str(&format!(
        "  pitch (mm)      {}\n",
        format_millimetres(grid.element_pitch())
    ));
    out.push_str(&format!("  channels        {:>9}\n", grid.total_elements()));
    out.push_str(&format!("  crystals        {:>9}\n", apparatus.elements.len()));
    out.push_str(&format!(
        "  excluded        {:>9}\n",
        grid.total_elements() - apparatus.elements.len(),
    ));
    out.push_str(&format!(
        "  crystal (mm)    {} x {} x {}\n",
        format_millimetres(2.0 * apparatus.crystal.half_x),
        format_millimetres(2.0 * apparatus.crystal.half_y),
        format_millimetres(2.0 * apparatus.crystal.half_z),
    ));
    out.push_str(&format!(
        "  front z (mm)    {}\n",
        format_millimetres(apparatus.calorimeter_z),
    ));
    out.push_str(&format!(
        "  mass (kg)       {:>9.1}\n",
        apparatus.calorimeter_mass_kg(),
    ));

    out.push_str("Lining\n");
    write_frame(&mut out, "outer", &apparatus.lining.outer);
    match &apparatus.lining.aperture {
        Some(frame) => write_frame(&mut out, "aperture", frame),
        None => {
            out.push_str("  aperture        none\n");
        }
    }

    out.push_str("Volumes\n");
    out.push_str(&format!(
        "  world           half {}\n",
        format_millimetres(apparatus.world_half_extent),
    ));
    out.push_str(&format!(
        "  target          half {}  z {}\n",
        format_millimetres(apparatus.target.solid.half_z),
        format_millimetres(apparatus.target.z),
    ));
    out.push_str(&format!(
        "  ring            r {} .. {}  z {}\n",
        format_millimetres(apparatus.ring.solid.inner_radius),
        format_millimetres(apparatus.ring.solid.outer_radius),
        format_millimetres(apparatus.ring.z),
    ));
    out.push_str(&format!(
        "  max step (mm)   {}\n",
        format_millimetres(apparatus.max_step),
    ));

    out.push_str("Materials\n");
    write_material(&mut out, "world", apparatus.world_material);
    write_material(&mut out, "target", apparatus.target.material);
    if let Some(element) = apparatus.elements.first() {
        write_material(&mut out, "calorimeter", element.material);
    }
    write_material(&mut out, "lining", apparatus.lining_material);

    emit_text(None, &out)?;
    Ok(0)
}

fn write_frame(out: &mut String, label: &str, frame: &BoxFrame) {
    out.push_str(&format!(
        "  {:<15} half {} minus {}  depth {}  centre {}\n",
        label,
        format_millimetres(frame.outer_half_extent),
        format_millimetres(frame.inner_half_extent),
        format_millimetres(2.0 * frame.half_depth),
        format_millimetres(frame.centre),
    ));
}

fn write_material(out: &mut String, role: &str, material: &Material) {
    out.push_str(&format!(
        "  {:<15} {} ({} g/cm3)\n",
        role,
        material.name,
        format_density(material.density),
    ));
}

pub(super) fn run_replay_command(args: ReplayArgs) -> Result<i32, CliError> {
    if args.workers == 0 {
        return Err(CliError::Usage("--workers must be at least 1".to_string()));
    }

    let config = args.config.load()?;
    let layout = build_layout(&config)?;
    let events = read_replay_events(&args.events)?;
    let writer = CsvTableWriter::create(&args.output_dir, layout.total_elements())?;

    let (committed, discarded, writer) = if args.workers == 1 {
        let mut pipeline = EventPipeline::new(&layout, writer);
        let mut committed = 0usize;
        let mut discarded = 0usize;
        for event in &events {
            match pipeline.process(event)? {
                EventOutcome::Committed(_) => committed += 1,
                EventOutcome::Discarded => discarded += 1,
            }
        }
        (committed, discarded, pipeline.finish()?)
    } else {
        let merged = aggregate_in_workers(&layout, &events, args.workers)?;
        let mut writer = writer;
        for rows in &merged.rows {
            append_event_rows(&mut writer, rows)?;
        }
        writer.flush()?;
        (merged.rows.len(), merged.discarded as usize, writer)
    };

    println!(
        "Replay committed {} event(s), discarded {}",
        committed, discarded
    );
    for table in OutputTable::ALL {
        println!(
            "  {} ({} rows): {}",
            table,
            writer.rows_written(table),
            args.output_dir.join(table.file_name()).display()
        );
    }
    Ok(0)
}
