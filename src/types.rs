use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ValidationError};
use crate::guillotine::SheetLayout;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn rotated(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.width <= other.width && self.height <= other.height
    }

    /// True when the rect fits `other` as given or turned 90°.
    pub fn fits_in_any_orientation(&self, other: &Rect) -> bool {
        self.fits_in(other) || self.rotated().fits_in(other)
    }

    fn is_valid_dimension(v: f64) -> bool {
        v.is_finite() && v > 0.0
    }

    /// Positive finite sides whose area neither overflows nor underflows.
    pub fn is_valid(&self) -> bool {
        Self::is_valid_dimension(self.width)
            && Self::is_valid_dimension(self.height)
            && self.area().is_normal()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One line of the cut list: a piece size and how many of it are needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieceRequest {
    pub width: f64,
    pub height: f64,
    pub quantity: u32,
}

impl PieceRequest {
    pub fn new(width: f64, height: f64, quantity: u32) -> Self {
        Self {
            width,
            height,
            quantity,
        }
    }

    /// Builds a request from an untrusted signed quantity, as decoded from a
    /// form or JSON body.
    pub fn from_raw(index: usize, width: f64, height: f64, quantity: i64) -> Result<Self> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|&q| q > 0)
            .ok_or(ValidationError::InvalidQuantity { index, quantity })?;
        let request = Self::new(width, height, quantity);
        request.validate(index)?;
        Ok(request)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.rect().is_valid() {
            return Err(ValidationError::InvalidPiece {
                index,
                width: self.width,
                height: self.height,
            });
        }
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity { index, quantity: 0 });
        }
        Ok(())
    }
}

/// A single unit expanded from a [`PieceRequest`]. Mutated once, when placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceInstance {
    pub request_index: usize,
    pub width: f64,
    pub height: f64,
    pub placed: bool,
    pub sheet_index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl PieceInstance {
    pub fn new(request_index: usize, rect: Rect) -> Self {
        Self {
            request_index,
            width: rect.width,
            height: rect.height,
            placed: false,
            sheet_index: None,
            x: 0.0,
            y: 0.0,
            rotated: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn mark_placed(&mut self, sheet_index: usize, placement: &Placement) {
        self.placed = true;
        self.sheet_index = Some(sheet_index);
        self.x = placement.x;
        self.y = placement.y;
        self.rotated = placement.rotated;
    }
}

/// A piece as laid out on a sheet. `width`/`height` are the requested
/// dimensions; the occupied area is [`Placement::footprint`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub request_index: usize,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl Placement {
    pub fn footprint(&self) -> Rect {
        let rect = Rect::new(self.width, self.height);
        if self.rotated { rect.rotated() } else { rect }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.footprint().width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.footprint().height
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Unused rectangle of a sheet, available for the next piece.
///
/// Stored by its absolute edges so that fit tests and placement positions
/// come from the same additions and never drift past the sheet edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeRegion {
    pub x: f64,
    pub y: f64,
    pub right: f64,
    pub bottom: f64,
}

impl FreeRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.x
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when `piece`, anchored at the region's corner, stays inside it.
    pub fn fits(&self, piece: Rect) -> bool {
        self.x + piece.width <= self.right && self.y + piece.height <= self.bottom
    }
}

/// A requested unit that exceeds the sheet in both orientations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnplaceablePiece {
    pub request_index: usize,
    pub width: f64,
    pub height: f64,
}

impl From<&PieceInstance> for UnplaceablePiece {
    fn from(instance: &PieceInstance) -> Self {
        Self {
            request_index: instance.request_index,
            width: instance.width,
            height: instance.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackingResult {
    pub sheet: Rect,
    pub sheets: Vec<SheetLayout>,
    pub unplaceable: Vec<UnplaceablePiece>,
}

impl PackingResult {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    /// Every requested unit, placed or not.
    pub fn piece_count(&self) -> usize {
        self.placed_count() + self.unplaceable.len()
    }

    pub fn used_area(&self) -> f64 {
        self.sheets.iter().map(SheetLayout::used_area).sum()
    }

    /// Mean of the per-sheet fractions, which equals total placed area over
    /// total sheet area without ever summing sheet areas.
    pub fn utilization_percent(&self) -> f64 {
        if self.sheets.is_empty() {
            return 0.0;
        }
        let fraction: f64 = self
            .sheets
            .iter()
            .map(|s| s.used_area() / s.area())
            .sum();
        fraction / self.sheets.len() as f64 * 100.0
    }

    pub fn waste_percent(&self) -> f64 {
        if self.sheets.is_empty() {
            return 0.0;
        }
        100.0 - self.utilization_percent()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts a quantity as a JSON integer, a whole float, or a numeric string,
/// the shapes form encoders produce.
pub fn deserialize_quantity<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Int(n) => Ok(n),
        RawQuantity::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        RawQuantity::Float(f) => Err(D::Error::custom(format!(
            "quantity must be a whole number, got {f}"
        ))),
        RawQuantity::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("invalid quantity '{s}'"))),
    }
}
