#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for IOS site scoring.
//!
//! Reads parcel and building footprint `GeoJSON`, runs the scoring
//! pipeline, and writes the scored properties with the audit report as
//! JSON. Log output goes through [`ios_cli_utils::init_logger`] so log
//! lines and progress bars never fight for the terminal.

mod features;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ios_cli_utils::IndicatifProgress;
use ios_parcel_models::{AuditReport, ScoredProperty};
use ios_pipeline::{RunConfig, RunInput};
use ios_scoring::composite::analysis;
use serde::Serialize;

use crate::features::FieldMap;

#[derive(Parser)]
#[command(name = "ios_score", about = "Industrial outdoor storage site scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score parcels against building footprints
    Score {
        /// Parcel `GeoJSON` feature collection (WGS84 lon/lat)
        #[arg(long)]
        parcels: PathBuf,
        /// Building footprint `GeoJSON` feature collection (WGS84 lon/lat)
        #[arg(long)]
        footprints: PathBuf,
        /// TOML run configuration. Sections left out keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Only write properties that matched an acquisition spec
        #[arg(long)]
        filtered_only: bool,
        /// Read a field from a different feature property (e.g.
        /// `zoning_desc=ZONE_DESC`). May be repeated; repeated `land_use`
        /// mappings are joined with spaces.
        #[arg(long = "field-map", value_name = "KEY=PROPERTY")]
        field_map: Vec<String>,
        /// Print the score breakdown of the top N properties to stderr
        #[arg(long, value_name = "N")]
        explain: Option<usize>,
    },
    /// Load and validate a run configuration
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default run configuration
    PrintConfig,
}

#[derive(Serialize)]
struct Output<'a> {
    report: &'a AuditReport,
    properties: Vec<&'a ScoredProperty>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = ios_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            parcels,
            footprints,
            config,
            output,
            filtered_only,
            field_map,
            explain,
        } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;
            let fields = FieldMap::with_overrides(&field_map)?;

            let parcels = features::parcels(read_features(&parcels)?, &fields);
            let footprints = features::footprints(read_features(&footprints)?, &fields);
            log::info!(
                "Loaded {} parcels and {} footprints",
                parcels.len(),
                footprints.len()
            );

            let input = RunInput::new()
                .with_parcels(parcels)
                .with_footprints(footprints);

            let progress = IndicatifProgress::stage_bar(&multi, "Scoring");
            let result = ios_pipeline::run(&config, input, progress.as_ref())?;

            if let Some(n) = explain {
                for property in result.properties.iter().take(n) {
                    eprintln!("── {} ──", property.parcel_id);
                    eprintln!("{}", analysis(&property.score_card(), &config.scoring.weights));
                }
            }

            let properties = if filtered_only {
                result.filtered().collect()
            } else {
                result.properties.iter().collect()
            };
            let json = serde_json::to_string_pretty(&Output {
                report: &result.report,
                properties,
            })?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("Wrote {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::CheckConfig { config } => {
            let config = load_config(config.as_deref())?;
            config.validate()?;
            println!(
                "Configuration OK: {} criteria specs, study area '{}' ({} km)",
                config.scoring.criteria.len(),
                config.study_area.name,
                config.study_area.radius_km,
            );
        }
        Commands::PrintConfig => {
            print!("{}", RunConfig::default().to_toml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(RunConfig::from_toml(&text)?)
}

fn read_features(path: &Path) -> Result<geojson::FeatureCollection, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(features::read_collection(&path.display().to_string(), &text)?)
}
