//! Request and response bodies shared by the HTTP server and the CLI's JSON
//! output.

use serde::{Deserialize, Serialize};

use crate::engine::PackingEngine;
use crate::error::Result;
use crate::types::{
    PackingResult, PieceRequest, Placement, Rect, UnplaceablePiece, deserialize_quantity,
};

#[derive(Debug, Deserialize, Serialize)]
pub struct OptimizeRequest {
    pub sheet: Rect,
    pub cuts: Vec<CutRequest>,
}

/// One cut-list row as submitted. The quantity stays signed until validated.
#[derive(Debug, Deserialize, Serialize)]
pub struct CutRequest {
    pub width: f64,
    pub height: f64,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OptimizeResponse {
    pub sheet: Rect,
    pub sheets: Vec<SheetResponse>,
    pub sheet_count: usize,
    pub piece_count: usize,
    pub placed_count: usize,
    pub used_area: f64,
    pub utilization_percent: f64,
    pub waste_percent: f64,
    pub unplaceable: Vec<UnplaceablePiece>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SheetResponse {
    pub width: f64,
    pub height: f64,
    pub placements: Vec<Placement>,
    pub used_area: f64,
    pub waste_area: f64,
    pub utilization_percent: f64,
}

impl OptimizeRequest {
    pub fn piece_requests(&self) -> Result<Vec<PieceRequest>> {
        self.cuts
            .iter()
            .enumerate()
            .map(|(i, c)| PieceRequest::from_raw(i, c.width, c.height, c.quantity))
            .collect()
    }
}

impl From<&PackingResult> for OptimizeResponse {
    fn from(result: &PackingResult) -> Self {
        Self {
            sheet: result.sheet,
            sheets: result
                .sheets
                .iter()
                .map(|s| SheetResponse {
                    width: s.width,
                    height: s.height,
                    placements: s.placements.clone(),
                    used_area: s.used_area(),
                    waste_area: s.waste_area(),
                    utilization_percent: s.utilization_percent(),
                })
                .collect(),
            sheet_count: result.sheet_count(),
            piece_count: result.piece_count(),
            placed_count: result.placed_count(),
            used_area: result.used_area(),
            utilization_percent: result.utilization_percent(),
            waste_percent: result.waste_percent(),
            unplaceable: result.unplaceable.clone(),
        }
    }
}

/// Validates the request, packs it, and shapes the response.
pub fn optimize(request: &OptimizeRequest, max_instances: usize) -> Result<OptimizeResponse> {
    let requests = request.piece_requests()?;
    let result = PackingEngine::new(request.sheet, requests)
        .with_max_instances(max_instances)
        .pack()?;
    Ok(OptimizeResponse::from(&result))
}
