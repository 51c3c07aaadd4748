use serde::Serialize;

use crate::core::corpus::RowWindow;

/// One search hit, carrying both normalized vectors for overlay rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarItem {
    pub series_id: String,
    pub score: f64,
    /// 1-based.
    pub rank: usize,
    /// Dates of the matched segment, absent for whole-series rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<RowWindow>,
    /// The matched corpus row.
    pub series_norm: Vec<f64>,
    /// The normalized query it was compared against.
    pub sketch_norm: Vec<f64>,
}

/// Ranked answer to a sketch search, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SimilarItem>,
}

impl SearchResponse {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn series_ids(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.series_id.as_str()).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
