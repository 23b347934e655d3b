//! crosslock-timelock
//!
//! The stage schedule and the Dutch-auction reserve curve. The data type
//! (`Timelocks`) lives in crosslock-core with the objects that embed it; this
//! crate owns the logic: schedule validation, stage selection per side, the
//! rescue window, and the price curve.

pub mod auction;
pub mod stage;

pub use auction::DutchAuction;
pub use stage::{dst_stage, rescue_start, src_stage, validate, DstStage, SrcStage};
