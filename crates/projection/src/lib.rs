//! Map projections for native model grids.
//!
//! Implemented from scratch without external dependencies.

pub mod lambert;

pub use lambert::{LambertConformal, LambertParameters};
