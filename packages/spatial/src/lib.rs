#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial index for footprint attribution.
//!
//! Builds an R-tree over normalized parcel polygons once, then matches each
//! building footprint against the parcels whose envelopes it touches.
//! Footprints straddling parcel boundaries are apportioned by overlap area
//! so no building area is dropped or counted twice. The per-parcel
//! attributions feed the [`coverage`] calculator.

pub mod coverage;
pub mod index;
pub mod matcher;

pub use coverage::{Attribution, Coverage, attributions_by_parcel, compute_coverage};
pub use index::ParcelIndex;
pub use matcher::{
    ApportionBasis, Apportionment, FootprintMatch, MatchConfig, match_footprint, match_footprints,
};
