//! Run input records and the batch builder.

use ios_geometry::GeographicPolygon;
use ios_parcel_models::{FootprintSource, ParcelAttributes};

/// A parcel as received from the assessor data.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelInput {
    pub id: String,
    pub boundary: GeographicPolygon,
    pub attributes: ParcelAttributes,
}

/// A building footprint as received from the footprint dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintInput {
    pub id: String,
    pub polygon: GeographicPolygon,
    pub source: FootprintSource,
}

/// Parcels and footprints for one run.
///
/// Records can be pushed one at a time as they are acquired or supplied
/// as whole batches; the run does not depend on delivery order.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub(crate) parcels: Vec<ParcelInput>,
    pub(crate) footprints: Vec<FootprintInput>,
}

impl RunInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parcels(mut self, parcels: impl IntoIterator<Item = ParcelInput>) -> Self {
        self.extend_parcels(parcels);
        self
    }

    #[must_use]
    pub fn with_footprints(mut self, footprints: impl IntoIterator<Item = FootprintInput>) -> Self {
        self.extend_footprints(footprints);
        self
    }

    pub fn push_parcel(&mut self, parcel: ParcelInput) {
        self.parcels.push(parcel);
    }

    pub fn push_footprint(&mut self, footprint: FootprintInput) {
        self.footprints.push(footprint);
    }

    pub fn extend_parcels(&mut self, parcels: impl IntoIterator<Item = ParcelInput>) {
        self.parcels.extend(parcels);
    }

    pub fn extend_footprints(&mut self, footprints: impl IntoIterator<Item = FootprintInput>) {
        self.footprints.extend(footprints);
    }

    #[must_use]
    pub fn parcel_count(&self) -> usize {
        self.parcels.len()
    }

    #[must_use]
    pub fn footprint_count(&self) -> usize {
        self.footprints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(id: &str) -> ParcelInput {
        ParcelInput {
            id: id.to_string(),
            boundary: GeographicPolygon::from_exterior(&[(0.0, 0.0), (0.001, 0.0), (0.001, 0.001)]),
            attributes: ParcelAttributes::default(),
        }
    }

    #[test]
    fn incremental_and_batch_ingestion_agree() {
        let mut incremental = RunInput::new();
        incremental.push_parcel(parcel("a"));
        incremental.push_parcel(parcel("b"));

        let batch = RunInput::new().with_parcels([parcel("a"), parcel("b")]);

        assert_eq!(incremental.parcels, batch.parcels);
        assert_eq!(batch.parcel_count(), 2);
        assert_eq!(batch.footprint_count(), 0);
    }
}
