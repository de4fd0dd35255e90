pub mod types;
pub mod registration;
pub mod validator;

pub use types::*;
pub use registration::*;
pub use validator::*;
