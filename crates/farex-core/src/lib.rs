pub mod config;
pub mod datasource;
pub mod diag;
pub mod error;
pub mod interval;
pub mod job;
pub mod records;
pub mod spec_cache;
pub mod types;

pub use config::*;
pub use datasource::*;
pub use diag::*;
pub use error::*;
pub use interval::*;
pub use job::*;
pub use records::*;
pub use spec_cache::*;
pub use types::*;
