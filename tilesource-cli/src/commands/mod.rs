//! CLI subcommands.

pub mod bounds;
pub mod simulate;
