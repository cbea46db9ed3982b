pub mod cli;
pub mod daemon;
pub mod reboot;

pub use cli::*;
pub use daemon::*;
pub use reboot::*;
