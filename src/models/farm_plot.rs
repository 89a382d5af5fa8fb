//! Farm plot boundary annotations

use serde::{Deserialize, Serialize};

/// Colors handed out to new plots, in order
pub const PLOT_COLORS: [&str; 8] = [
    "#2E7D32", "#1565C0", "#EF6C00", "#6A1B9A", "#C62828", "#00838F", "#9E9D24", "#4E342E",
];

/// A GPS point on a plot boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Polygon boundary tied to one beneficiary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPlot {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub beneficiary_id: String,
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
    #[serde(default)]
    pub color: String,
}

impl FarmPlot {
    /// Arithmetic mean of the boundary points, used to place labels
    pub fn centroid(&self) -> Option<Coordinate> {
        if self.coordinates.is_empty() {
            return None;
        }
        let n = self.coordinates.len() as f64;
        let (lat, lng) = self
            .coordinates
            .iter()
            .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
        Some(Coordinate::new(lat / n, lng / n))
    }
}

/// JSON body for farm plot create/update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPlotPayload {
    pub beneficiary_id: String,
    pub coordinates: Vec<Coordinate>,
    pub color: String,
}
