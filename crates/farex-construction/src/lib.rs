pub mod atpco;
pub mod bundle;
pub mod comb_class;
pub mod constructed;
pub mod cortege;
pub mod dup;
pub mod gateway_pair;
pub mod sita;
pub mod smf;
pub mod trf_xref;
pub mod vendor;
pub mod zone;

pub use bundle::*;
pub use comb_class::*;
pub use constructed::*;
pub use cortege::*;
pub use dup::*;
pub use gateway_pair::*;
pub use trf_xref::*;
pub use vendor::*;
pub use zone::*;

// Re-export common types for convenience
pub use farex_core::{ConstructionJob, FarexError, Result};
