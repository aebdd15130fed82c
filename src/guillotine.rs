use serde::{Deserialize, Serialize};

use crate::types::{FreeRegion, PieceInstance, Placement, Rect};

/// One sheet being filled: its placements in order and its free regions in
/// creation order. The free list is only ever rebuilt by [`SheetLayout::place`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub width: f64,
    pub height: f64,
    pub placements: Vec<Placement>,
    pub free_regions: Vec<FreeRegion>,
}

/// Where a piece would go: index into the free list and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fit {
    pub region_idx: usize,
    pub rotated: bool,
}

impl SheetLayout {
    pub fn new(sheet: Rect) -> Self {
        Self {
            width: sheet.width,
            height: sheet.height,
            placements: Vec::new(),
            free_regions: vec![FreeRegion::new(0.0, 0.0, sheet.width, sheet.height)],
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn used_area(&self) -> f64 {
        self.placements.iter().map(Placement::area).sum()
    }

    pub fn free_area(&self) -> f64 {
        self.free_regions.iter().map(FreeRegion::area).sum()
    }

    pub fn waste_area(&self) -> f64 {
        self.area() - self.used_area()
    }

    pub fn utilization_percent(&self) -> f64 {
        if self.area() == 0.0 {
            return 0.0;
        }
        self.used_area() / self.area() * 100.0
    }

    /// First free region, oldest first, that takes the piece. Within a region
    /// the direct orientation is tried before the rotated one.
    pub fn find_first(&self, piece: Rect) -> Option<Fit> {
        self.free_regions
            .iter()
            .enumerate()
            .find_map(|(idx, free)| {
                if free.fits(piece) {
                    Some(Fit {
                        region_idx: idx,
                        rotated: false,
                    })
                } else if free.fits(piece.rotated()) {
                    Some(Fit {
                        region_idx: idx,
                        rotated: true,
                    })
                } else {
                    None
                }
            })
    }

    pub fn place(&mut self, fit: Fit, piece: &PieceInstance) -> Placement {
        let free = self.free_regions[fit.region_idx];
        let placed = if fit.rotated {
            piece.rect().rotated()
        } else {
            piece.rect()
        };

        let placement = Placement {
            request_index: piece.request_index,
            width: piece.width,
            height: piece.height,
            x: free.x,
            y: free.y,
            rotated: fit.rotated,
        };

        self.free_regions = Self::split(&self.free_regions, fit.region_idx, placed);
        self.placements.push(placement);

        placement
    }

    /// Next free list: every region except the consumed one, in order, then
    /// the right remainder, then the bottom remainder.
    fn split(regions: &[FreeRegion], consumed: usize, placed: Rect) -> Vec<FreeRegion> {
        let free = regions[consumed];
        let mut next = Vec::with_capacity(regions.len() + 1);
        next.extend(
            regions
                .iter()
                .enumerate()
                .filter(|&(idx, _)| idx != consumed)
                .map(|(_, r)| *r),
        );

        let piece_right = free.x + placed.width;
        let piece_bottom = free.y + placed.height;

        // Right remainder spans only the piece's height
        if piece_right < free.right {
            next.push(FreeRegion {
                x: piece_right,
                y: free.y,
                right: free.right,
                bottom: piece_bottom,
            });
        }
        // Bottom remainder spans the full region width
        if piece_bottom < free.bottom {
            next.push(FreeRegion {
                x: free.x,
                y: piece_bottom,
                right: free.right,
                bottom: free.bottom,
            });
        }

        next
    }
}
