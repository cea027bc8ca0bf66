//! API implementation submodules.
//!
//! Each submodule contains `impl ModelFinder` blocks that extend the public
//! API. The struct definition remains in `lib.rs`.

mod analysis;
mod builder;
mod refresh;
mod state;

pub use builder::ModelFinderBuilder;
pub use state::{AnalysisEvent, AnalysisSession, AnalysisSnapshot, AnalysisStats, RefreshedModel};
