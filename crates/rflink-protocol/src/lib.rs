pub mod commands;
pub mod payload;
pub mod task;
pub mod topics;

pub use commands::*;
pub use payload::*;
pub use task::*;
