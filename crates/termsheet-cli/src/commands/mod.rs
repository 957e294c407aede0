//! Command implementations.

pub mod config;
pub mod delete;
pub mod extract;
pub mod hash;
pub mod list;
pub mod show;
pub mod stats;

pub use self::config::execute_config;
pub use self::delete::execute_delete;
pub use self::extract::{execute_extract, run_batch};
pub use self::hash::execute_hash;
pub use self::list::execute_list;
pub use self::show::execute_show;
pub use self::stats::execute_stats;
