//! Positions module - average-cost position reconstruction.

pub mod position_calculator;
mod positions_model;

pub use position_calculator::PositionCalculator;
pub use positions_model::*;
