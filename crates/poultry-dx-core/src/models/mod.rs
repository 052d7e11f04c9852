//! Domain models for the poultry-dx system.

mod bird;
mod disease;
mod prediction;
mod symptom;

pub use bird::*;
pub use disease::*;
pub use prediction::*;
pub use symptom::*;
