use tracing::{debug, info, warn};

use crate::config::DEFAULT_MAX_INSTANCES;
use crate::error::{Result, ValidationError};
use crate::guillotine::SheetLayout;
use crate::types::{PackingResult, PieceInstance, PieceRequest, Rect, UnplaceablePiece};

/// Guillotine first-fit-decreasing packer for a single sheet size.
///
/// Pieces are expanded per quantity, stably sorted by decreasing area, then
/// poured sheet by sheet into the first free region that takes them. A run is
/// a pure function of the sheet size and the request list.
pub struct PackingEngine {
    sheet: Rect,
    requests: Vec<PieceRequest>,
    max_instances: usize,
}

impl PackingEngine {
    pub fn new(sheet: Rect, requests: Vec<PieceRequest>) -> Self {
        Self {
            sheet,
            requests,
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }

    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    pub fn pack(&self) -> Result<PackingResult> {
        self.validate()?;

        let mut instances = self.expand_requests();
        let mut unplaceable = Vec::new();

        // Anything too big for an empty sheet is reported up front
        for inst in instances.iter().filter(|i| !i.rect().fits_in_any_orientation(&self.sheet)) {
            warn!(
                piece = %inst.rect(),
                sheet = %self.sheet,
                request = inst.request_index,
                "piece exceeds sheet in both orientations"
            );
            unplaceable.push(UnplaceablePiece::from(inst));
        }

        let mut sheets: Vec<SheetLayout> = Vec::new();
        while instances.iter().any(|i| !i.placed && self.can_ever_fit(i)) {
            let sheet_index = sheets.len();
            let mut sheet = SheetLayout::new(self.sheet);
            let placed = self.fill_sheet(sheet_index, &mut sheet, &mut instances);
            debug!(sheet = sheet_index, placed, "sheet pass complete");

            if placed == 0 {
                // Cannot happen for pre-filtered input, but never loop on it
                for inst in instances.iter().filter(|i| !i.placed && self.can_ever_fit(i)) {
                    warn!(piece = %inst.rect(), "no fit on an empty sheet");
                    unplaceable.push(UnplaceablePiece::from(inst));
                }
                break;
            }
            sheets.push(sheet);
        }

        let result = PackingResult {
            sheet: self.sheet,
            sheets,
            unplaceable,
        };
        info!(
            sheets = result.sheet_count(),
            placed = result.placed_count(),
            unplaceable = result.unplaceable.len(),
            utilization = result.utilization_percent(),
            "packing finished"
        );
        Ok(result)
    }

    fn validate(&self) -> Result<()> {
        if !self.sheet.is_valid() {
            return Err(ValidationError::InvalidSheet {
                width: self.sheet.width,
                height: self.sheet.height,
            });
        }
        for (index, request) in self.requests.iter().enumerate() {
            request.validate(index)?;
        }
        let count = self.instance_count();
        if count > self.max_instances as u64 {
            return Err(ValidationError::TooManyPieces {
                count,
                limit: self.max_instances,
            });
        }
        Ok(())
    }

    fn instance_count(&self) -> u64 {
        self.requests.iter().map(|r| u64::from(r.quantity)).sum()
    }

    fn expand_requests(&self) -> Vec<PieceInstance> {
        let mut instances = Vec::with_capacity(self.instance_count() as usize);
        for (idx, request) in self.requests.iter().enumerate() {
            for _ in 0..request.quantity {
                instances.push(PieceInstance::new(idx, request.rect()));
            }
        }
        // Stable: equal areas keep request order
        instances.sort_by(|a, b| b.area().total_cmp(&a.area()));
        instances
    }

    fn can_ever_fit(&self, instance: &PieceInstance) -> bool {
        instance.rect().fits_in_any_orientation(&self.sheet)
    }

    /// One pass over every still-unplaced instance, in sorted order.
    fn fill_sheet(
        &self,
        sheet_index: usize,
        sheet: &mut SheetLayout,
        instances: &mut [PieceInstance],
    ) -> usize {
        let mut placed = 0;
        for inst in instances.iter_mut().filter(|i| !i.placed) {
            if sheet.free_regions.is_empty() {
                break;
            }
            if let Some(fit) = sheet.find_first(inst.rect()) {
                let placement = sheet.place(fit, inst);
                inst.mark_placed(sheet_index, &placement);
                placed += 1;
            }
        }
        placed
    }
}

/// Packs `requests` onto sheets of size `sheet` with default limits.
pub fn pack(sheet: Rect, requests: &[PieceRequest]) -> Result<PackingResult> {
    PackingEngine::new(sheet, requests.to_vec()).pack()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Placement;

    /// Validates a complete result:
    /// 1. Every placement fits within the sheet
    /// 2. No two placements on the same sheet overlap
    /// 3. Placed plus unplaceable matches the requested unit count
    fn assert_result_valid(result: &PackingResult, expected_pieces: usize) {
        let sheet = result.sheet;
        assert_eq!(
            result.piece_count(),
            expected_pieces,
            "expected {} pieces accounted for, got {}",
            expected_pieces,
            result.piece_count()
        );

        for (si, layout) in result.sheets.iter().enumerate() {
            for (pi, p) in layout.placements.iter().enumerate() {
                assert!(
                    p.x >= 0.0 && p.right() <= sheet.width,
                    "sheet {si}, piece {pi} exceeds sheet width: x={} right={} > {}",
                    p.x,
                    p.right(),
                    sheet.width
                );
                assert!(
                    p.y >= 0.0 && p.bottom() <= sheet.height,
                    "sheet {si}, piece {pi} exceeds sheet height: y={} bottom={} > {}",
                    p.y,
                    p.bottom(),
                    sheet.height
                );
            }
            assert_no_overlaps(si, &layout.placements);
        }
    }

    fn assert_no_overlaps(sheet_idx: usize, placements: &[Placement]) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let a = &placements[i];
                let b = &placements[j];
                assert!(
                    !a.overlaps(b),
                    "sheet {sheet_idx}: piece {i} ({} @ ({},{})) overlaps piece {j} ({} @ ({},{}))",
                    a.footprint(),
                    a.x,
                    a.y,
                    b.footprint(),
                    b.x,
                    b.y
                );
            }
        }
    }

    fn engine(sheet: (f64, f64), pieces: &[(f64, f64, u32)]) -> PackingEngine {
        PackingEngine::new(
            Rect::new(sheet.0, sheet.1),
            pieces
                .iter()
                .map(|&(w, h, q)| PieceRequest::new(w, h, q))
                .collect(),
        )
    }

    #[test]
    fn test_single_full_sheet() {
        let result = engine((100.0, 100.0), &[(100.0, 100.0, 1)]).pack().unwrap();
        assert_result_valid(&result, 1);
        assert_eq!(result.sheet_count(), 1);
        let p = result.sheets[0].placements[0];
        assert_eq!((p.x, p.y), (0.0, 0.0));
        assert_eq!(result.utilization_percent(), 100.0);
        assert_eq!(result.waste_percent(), 0.0);
    }

    #[test]
    fn test_two_complementary_pieces_share_sheet() {
        let result = engine((100.0, 100.0), &[(60.0, 40.0, 1), (40.0, 60.0, 1)])
            .pack()
            .unwrap();
        assert_result_valid(&result, 2);
        assert_eq!(result.sheet_count(), 1);
        // Equal area, so request order holds: 60x40 first, 40x60 in the bottom strip
        let placements = &result.sheets[0].placements;
        assert_eq!(placements[0].request_index, 0);
        assert_eq!((placements[1].x, placements[1].y), (0.0, 40.0));
        assert!((result.utilization_percent() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_oversized_piece_unplaceable() {
        let result = engine((10.0, 10.0), &[(11.0, 5.0, 1)]).pack().unwrap();
        assert_result_valid(&result, 1);
        assert_eq!(result.sheet_count(), 0);
        assert_eq!(
            result.unplaceable,
            vec![UnplaceablePiece {
                request_index: 0,
                width: 11.0,
                height: 5.0
            }]
        );
        assert_eq!(result.waste_percent(), 0.0);
    }

    #[test]
    fn test_l_shaped_leftover_forces_new_sheets() {
        let result = engine((50.0, 50.0), &[(30.0, 30.0, 3)]).pack().unwrap();
        assert_result_valid(&result, 3);
        assert!(result.unplaceable.is_empty());
        assert!(result.sheet_count() >= 2);
        // 20x30 and 50x20 leftovers cannot take another 30x30
        assert_eq!(result.sheet_count(), 3);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = engine((100.0, 100.0), &[(10.0, 10.0, 0)]).pack().unwrap_err();
        assert_eq!(err, ValidationError::InvalidQuantity { index: 0, quantity: 0 });
    }

    #[test]
    fn test_negative_dimension_rejected() {
        let err = engine((100.0, 100.0), &[(10.0, 10.0, 1), (-5.0, 10.0, 1)])
            .pack()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPiece { index: 1, .. }));
    }

    #[test]
    fn test_invalid_sheet_rejected() {
        for sheet in [(0.0, 10.0), (10.0, -1.0), (f64::NAN, 10.0), (10.0, f64::INFINITY)] {
            let err = engine(sheet, &[(1.0, 1.0, 1)]).pack().unwrap_err();
            assert!(matches!(err, ValidationError::InvalidSheet { .. }));
        }
    }

    #[test]
    fn test_extreme_areas_rejected() {
        let err = engine((1e200, 1e200), &[(1.0, 1.0, 1)]).pack().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSheet { .. }));
        let err = engine((10.0, 10.0), &[(1e-200, 1e-200, 1)]).pack().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPiece { index: 0, .. }));
    }

    #[test]
    fn test_utilization_near_f64_max() {
        // Two 1e308 sheets would overflow a summed sheet area
        let result = engine((1e154, 1e154), &[(1e154, 1e154, 2)]).pack().unwrap();
        assert_eq!(result.sheet_count(), 2);
        assert_eq!(result.utilization_percent(), 100.0);
        assert_eq!(result.waste_percent(), 0.0);
    }

    #[test]
    fn test_full_sheet_ends_pass() {
        let e = engine((100.0, 100.0), &[(100.0, 100.0, 3), (1.0, 1.0, 2)]);
        let mut instances = e.expand_requests();
        let mut sheet = SheetLayout::new(e.sheet);
        let placed = e.fill_sheet(0, &mut sheet, &mut instances);
        assert_eq!(placed, 1);
        assert!(sheet.free_regions.is_empty());
        assert_eq!(instances.iter().filter(|i| i.placed).count(), 1);

        let result = e.pack().unwrap();
        assert_result_valid(&result, 5);
        assert_eq!(result.sheet_count(), 4);
    }

    #[test]
    fn test_instance_cap() {
        let err = engine((100.0, 100.0), &[(1.0, 1.0, 6), (2.0, 2.0, 5)])
            .with_max_instances(10)
            .pack()
            .unwrap_err();
        assert_eq!(err, ValidationError::TooManyPieces { count: 11, limit: 10 });
    }

    #[test]
    fn test_no_requests() {
        let result = engine((100.0, 100.0), &[]).pack().unwrap();
        assert_result_valid(&result, 0);
        assert_eq!(result.sheet_count(), 0);
        assert_eq!(result.utilization_percent(), 0.0);
    }

    #[test]
    fn test_rotation_helps() {
        let result = engine((100.0, 50.0), &[(50.0, 100.0, 1)]).pack().unwrap();
        assert_result_valid(&result, 1);
        assert_eq!(result.sheet_count(), 1);
        assert!(result.sheets[0].placements[0].rotated);
    }

    #[test]
    fn test_exact_fit_four_pieces() {
        let result = engine((100.0, 100.0), &[(50.0, 50.0, 4)]).pack().unwrap();
        assert_result_valid(&result, 4);
        assert_eq!(result.sheet_count(), 1);
        let positions: Vec<(f64, f64)> = result.sheets[0]
            .placements
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(positions, vec![(0.0, 0.0), (50.0, 0.0), (0.0, 50.0), (50.0, 50.0)]);
    }

    #[test]
    fn test_larger_pieces_placed_first() {
        let result = engine((100.0, 100.0), &[(10.0, 10.0, 2), (80.0, 80.0, 1)])
            .pack()
            .unwrap();
        assert_result_valid(&result, 3);
        assert_eq!(result.sheets[0].placements[0].request_index, 1);
    }

    #[test]
    fn test_mixed_placeable_and_oversized() {
        let result = engine((100.0, 100.0), &[(150.0, 150.0, 2), (50.0, 50.0, 3)])
            .pack()
            .unwrap();
        assert_result_valid(&result, 5);
        assert_eq!(result.placed_count(), 3);
        assert_eq!(result.unplaceable.len(), 2);
        assert!(result.unplaceable.iter().all(|u| u.request_index == 0));
    }

    #[test]
    fn test_fractional_dimensions() {
        let result = engine((2050.0, 3050.0), &[(612.5, 400.25, 7), (1000.0, 333.3, 4)])
            .pack()
            .unwrap();
        assert_result_valid(&result, 11);
        assert!(result.unplaceable.is_empty());
    }

    /// 30 pieces, 6 different sizes, standard plywood sheet 2440x1220.
    #[test]
    fn test_complex_mixed_sizes() {
        let sheet = Rect::new(2440.0, 1220.0);
        let requests = vec![
            PieceRequest::new(800.0, 600.0, 5),
            PieceRequest::new(400.0, 300.0, 8),
            PieceRequest::new(600.0, 400.0, 4),
            PieceRequest::new(1200.0, 600.0, 3),
            PieceRequest::new(300.0, 200.0, 6),
            PieceRequest::new(500.0, 500.0, 4),
        ];
        let result = PackingEngine::new(sheet, requests).pack().unwrap();
        assert_result_valid(&result, 30);
        assert!(result.unplaceable.is_empty());

        // Lower bound: total piece area / sheet area
        let min_sheets = (result.used_area() / sheet.area()).ceil() as usize;
        assert!(result.sheet_count() >= min_sheets);
    }

    /// 32 pieces, 5 different sizes, small sheet forcing many sheets.
    #[test]
    fn test_complex_small_sheet_many_sheets() {
        let requests = [
            (200.0, 150.0, 8),
            (300.0, 200.0, 6),
            (150.0, 100.0, 7),
            (250.0, 180.0, 5),
            (400.0, 300.0, 6),
        ];
        let result = engine((500.0, 400.0), &requests).pack().unwrap();
        assert_result_valid(&result, 32);
        assert!(result.sheet_count() >= 5);
    }

    #[test]
    fn test_instances_record_sheet_index() {
        let e = engine((50.0, 50.0), &[(30.0, 30.0, 2), (10.0, 10.0, 1)]);
        let mut instances = e.expand_requests();
        let mut sheet = SheetLayout::new(e.sheet);
        let placed = e.fill_sheet(0, &mut sheet, &mut instances);
        assert_eq!(placed, 2);
        assert_eq!(instances[0].sheet_index, Some(0));
        assert!(!instances[1].placed);
        assert_eq!(instances[1].sheet_index, None);
        assert_eq!(instances[2].sheet_index, Some(0));
        assert_eq!((instances[2].x, instances[2].y), (30.0, 0.0));
    }
}
