pub mod args;
pub mod commands;

pub use args::{Cli, Commands, TuningArgs};
pub use commands::run;
