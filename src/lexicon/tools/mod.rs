pub mod config;
pub mod confirm;
pub mod error;
pub mod gateway;
pub mod io;
pub mod logging;
pub mod model;
pub mod sync;
pub mod validate;

pub use error::{Result, ToolError};
