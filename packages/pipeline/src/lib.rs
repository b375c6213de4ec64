#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scoring run orchestration.
//!
//! A run takes a batch of parcels and building footprints (built up with
//! [`RunInput`]), validates the [`RunConfig`], then drives every stage:
//!
//! 1. Normalize parcel and footprint polygons, excluding the ones that
//!    cannot be repaired and parcels outside the study area.
//! 2. Match footprints to parcels through the R-tree index, apportioning
//!    footprints that straddle parcel lines.
//! 3. Compute per-parcel coverage, score the six dimensions, grade, and
//!    classify against the acquisition criteria.
//!
//! The output is sorted by composite score (highest first) and comes with
//! an [`AuditReport`](ios_parcel_models::AuditReport) counting everything
//! that was excluded or flagged along the way.

pub mod config;
pub mod input;
pub mod progress;
pub mod report;
pub mod run;

pub use config::{GeometryConfig, Hub, RunConfig, StudyArea};
pub use input::{FootprintInput, ParcelInput, RunInput};
pub use progress::{NullProgress, ProgressCallback};
pub use run::{RunOutput, run};

use ios_geometry::GeometryError;
use ios_scoring::ConfigurationError;
use thiserror::Error;

/// Errors that abort a run before any output is produced.
///
/// Per-geometry and per-parcel problems never surface here; they are
/// counted in the audit report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The projection or a configured position could not be built.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
