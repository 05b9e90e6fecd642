pub mod cache;
pub mod flush;
pub mod key;

pub use cache::*;
pub use flush::*;
pub use key::*;

pub use farex_construction::ConstructedCacheBundle;
pub use farex_core::{FarexError, Result};
