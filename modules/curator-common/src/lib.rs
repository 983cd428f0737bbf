pub mod categories;
pub mod config;
pub mod denylist;
pub mod error;
pub mod types;

pub use categories::{default_categories, AggregateBucket, CategoryProfile, CategoryTable};
pub use config::Config;
pub use error::{CuratorError, Result};
pub use types::*;
