//! Guillotine first-fit-decreasing cutlist packing.
//!
//! Pieces are sorted by decreasing area and poured sheet by sheet into the
//! first free region that takes them, directly or turned 90°. Leftover space
//! is split into a right strip and a bottom strip.
//!
//! ```
//! use cutlist_packer::{PieceRequest, Rect, pack};
//!
//! let result = pack(Rect::new(100.0, 100.0), &[PieceRequest::new(50.0, 50.0, 4)]).unwrap();
//! assert_eq!(result.sheet_count(), 1);
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod guillotine;
pub mod render;
pub mod types;

pub use engine::{PackingEngine, pack};
pub use error::{Result, ValidationError};
pub use guillotine::SheetLayout;
pub use types::{
    FreeRegion, PackingResult, PieceInstance, PieceRequest, Placement, Rect, UnplaceablePiece,
};
