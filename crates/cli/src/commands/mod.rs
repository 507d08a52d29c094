//! Command handlers for the Voyager CLI.

pub mod ask;
pub mod index;
pub mod stats;

pub use ask::AskCommand;
pub use index::IndexCommand;
pub use stats::StatsCommand;
