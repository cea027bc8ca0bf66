//! Installed model inventory reported by the host.

mod classifier;
mod string_like;

pub use classifier::{classify, InstalledInventory, KNOWN_ASSET_FIELDS};
pub use string_like::StringLike;
