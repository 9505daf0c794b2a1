//! Command-line interface orchestration for dendro.
//!
//! `cluster` reads a distance table, `distance` turns a data table into a
//! distance table, and `run` chains the two.

mod commands;
pub mod tsv;

pub use commands::{
    Cli, CliError, ClusterCommand, Command, CommandOutput, DistanceCommand, LinkageArgs,
    MetricArgs, RunCommand, render_output, run_cli,
};

#[cfg(test)]
mod test_helpers;
