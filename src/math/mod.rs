//! Mathematical utilities: standard normal helpers and adaptive quadrature.

pub mod kronrod;
pub mod normal;

pub use kronrod::*;
pub use normal::*;
