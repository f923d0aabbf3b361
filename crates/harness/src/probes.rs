//! The regression probes.

mod detached_slice;
mod memory_grow;

pub use detached_slice::DetachedSliceProbe;
pub use memory_grow::{check_growth, GrowthScenario, MemoryGrowProbe};
