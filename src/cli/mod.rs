//! Command line surface: `server`, `schema` and help.

mod command;
mod factory;
pub mod usage;

pub use command::*;
pub use factory::*;
