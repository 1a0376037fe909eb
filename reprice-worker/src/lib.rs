pub mod cli;
pub mod runner;

pub use cli::{Cli, Command};
pub use runner::{run_once, RunOptions};
