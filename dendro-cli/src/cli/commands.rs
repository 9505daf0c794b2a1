//! Command implementations and argument parsing for the dendro CLI.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dendro_core::{
    ClusterBuilder, ClusterError, DistanceError, DistanceMetric, Hclust, LinkageMethod,
    distance_matrix,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

use super::tsv::{self, DataTable, DistanceTable, TsvError};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "dendro",
    about = "Hierarchical clustering of tab-separated distance and data matrices."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Cluster a square distance matrix.
    Cluster(ClusterCommand),
    /// Compute a distance matrix from a data table.
    Distance(DistanceCommand),
    /// Compute distances from a data table and cluster them.
    Run(RunCommand),
}

/// Linkage and leaf-ordering options shared by `cluster` and `run`.
#[derive(Debug, Args, Clone)]
pub struct LinkageArgs {
    /// Linkage method: single, complete, average, mcquitty, ward, centroid
    /// or median.
    #[arg(long, default_value_t = LinkageMethod::Average)]
    pub method: LinkageMethod,

    /// Reorder leaves to minimise the distance between neighbours.
    #[arg(long)]
    pub optimize: bool,

    /// Skip the exhaustive ordering search for nodes whose pool-size product
    /// exceeds this value. Zero never skips.
    #[arg(long = "ignore-threshold", default_value_t = 0)]
    pub ignore_threshold: usize,
}

/// Metric options shared by `distance` and `run`.
#[derive(Debug, Args, Clone)]
pub struct MetricArgs {
    /// Distance metric: binary, canberra, jaccard, manhattan, maximum or
    /// euclidean.
    #[arg(long, default_value_t = DistanceMetric::Euclidean)]
    pub metric: DistanceMetric,

    /// Compare columns instead of rows.
    #[arg(long)]
    pub transpose: bool,
}

/// Options accepted by the `cluster` command.
#[derive(Debug, Args, Clone)]
pub struct ClusterCommand {
    /// Path to a distance table whose header row names the items.
    pub path: PathBuf,

    /// Linkage configuration.
    #[command(flatten)]
    pub linkage: LinkageArgs,
}

/// Options accepted by the `distance` command.
#[derive(Debug, Args, Clone)]
pub struct DistanceCommand {
    /// Path to a data table with row and column names.
    pub path: PathBuf,

    /// Metric configuration.
    #[command(flatten)]
    pub metric: MetricArgs,
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to a data table with row and column names.
    pub path: PathBuf,

    /// Metric configuration.
    #[command(flatten)]
    pub metric: MetricArgs,

    /// Linkage configuration.
    #[command(flatten)]
    pub linkage: LinkageArgs,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while opening an input table.
    #[error("failed to open `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input table was malformed.
    #[error("failed to parse `{path}`: {source}")]
    Parse {
        /// Path of the malformed table.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: TsvError,
    },
    /// Clustering failed.
    #[error(transparent)]
    Core(#[from] ClusterError),
    /// Distance computation failed.
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

/// Outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    /// A clustered tree with its leaf order.
    Tree(Hclust),
    /// A labelled distance matrix.
    Matrix(DistanceTable),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when reading, parsing, or clustering fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use dendro_cli::cli::{Cli, ClusterCommand, Command, CommandOutput, LinkageArgs, run_cli};
/// # use dendro_core::LinkageMethod;
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "x\ty\n0\t1\n1\t0\n")?;
/// let cli = Cli {
///     command: Command::Cluster(ClusterCommand {
///         path: file.path().to_path_buf(),
///         linkage: LinkageArgs {
///             method: LinkageMethod::Single,
///             optimize: false,
///             ignore_threshold: 0,
///         },
///     }),
/// };
/// let CommandOutput::Tree(hclust) = run_cli(cli)? else {
///     panic!("cluster must produce a tree");
/// };
/// assert_eq!(hclust.newick(), "(x:0.5,y:0.5)");
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli) -> Result<CommandOutput, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Cluster(command) => {
            span.record("command", field::display("cluster"));
            cluster_command(command).map(CommandOutput::Tree)
        }
        Command::Distance(command) => {
            span.record("command", field::display("distance"));
            distance_command(command).map(CommandOutput::Matrix)
        }
        Command::Run(command) => {
            span.record("command", field::display("run"));
            run_command(command).map(CommandOutput::Tree)
        }
    }
}

#[instrument(
    name = "cli.cluster",
    err,
    skip(command),
    fields(path = %command.path.display()),
)]
pub(super) fn cluster_command(command: ClusterCommand) -> Result<Hclust, CliError> {
    let table = read_table(&command.path, tsv::read_distance_table)?;
    cluster_table(&table, &command.linkage)
}

#[instrument(
    name = "cli.distance",
    err,
    skip(command),
    fields(path = %command.path.display(), metric = %command.metric.metric),
)]
pub(super) fn distance_command(command: DistanceCommand) -> Result<DistanceTable, CliError> {
    let data = read_table(&command.path, tsv::read_data_table)?;
    distance_table(data, &command.metric)
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command),
    fields(path = %command.path.display(), metric = %command.metric.metric),
)]
pub(super) fn run_command(command: RunCommand) -> Result<Hclust, CliError> {
    let data = read_table(&command.path, tsv::read_data_table)?;
    let table = distance_table(data, &command.metric)?;
    cluster_table(&table, &command.linkage)
}

fn cluster_table(table: &DistanceTable, linkage: &LinkageArgs) -> Result<Hclust, CliError> {
    let clusterer = ClusterBuilder::new()
        .with_method(linkage.method)
        .with_optimization(linkage.optimize)
        .with_ignore_threshold(linkage.ignore_threshold)
        .build()?;
    let hclust = clusterer.run(&table.matrix, &table.names)?;
    info!(
        items = table.names.len(),
        method = %linkage.method,
        "command completed"
    );
    Ok(hclust)
}

/// Computes distances between the rows of `data`, or its columns when
/// transposing, and labels them accordingly.
fn distance_table(data: DataTable, args: &MetricArgs) -> Result<DistanceTable, CliError> {
    let matrix = distance_matrix(&data.values, args.metric, args.transpose)?;
    let names = if args.transpose {
        data.columns
    } else {
        data.rows
    };
    info!(items = names.len(), metric = %args.metric, "distances computed");
    Ok(DistanceTable { names, matrix })
}

#[instrument(name = "cli.read_table", err, skip(parse), fields(path = %path.display()))]
pub(super) fn read_table<T>(
    path: &Path,
    parse: fn(File) -> Result<T, TsvError>,
) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(file).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders `output` to `writer`.
///
/// Trees are written as their Newick string followed by a line holding the
/// tab-separated leaf order. Matrices are written as a distance table that
/// `dendro cluster` accepts.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use dendro_cli::cli::{CommandOutput, render_output, tsv::DistanceTable};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let output = CommandOutput::Matrix(DistanceTable {
///     names: vec!["a".into(), "b".into()],
///     matrix: vec![vec![0.0, 2.5], vec![2.5, 0.0]],
/// });
/// let mut buffer = Vec::new();
/// render_output(&output, &mut buffer)?;
/// assert_eq!(String::from_utf8(buffer)?, "a\tb\n0\t2.5\n2.5\t0\n");
/// # Ok(())
/// # }
/// ```
pub fn render_output(output: &CommandOutput, mut writer: impl Write) -> io::Result<()> {
    match output {
        CommandOutput::Tree(hclust) => {
            writeln!(writer, "{}", hclust.newick())?;
            writeln!(writer, "{}", hclust.order().join("\t"))
        }
        CommandOutput::Matrix(table) => {
            tsv::write_distance_table(&table.names, &table.matrix, writer)
        }
    }
}
