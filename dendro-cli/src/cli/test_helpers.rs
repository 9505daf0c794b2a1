//! Small helpers shared across CLI tests.
//!
//! The CLI unit tests write temporary tables and assert error handling
//! behaviour. These helpers keep the test cases concise and consistent.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use dendro_core::{DistanceMetric, LinkageMethod};
use tempfile::TempDir;

use super::{Cli, CliError, LinkageArgs, MetricArgs, run_cli};

/// Five items whose single-linkage tree is `(((a,e),b),(c,d))`.
pub(super) const FIVE_ITEMS: &str = "a\tb\tc\td\te\n\
    0\t10\t23\t22.6\t2\n\
    10\t0\t17.8\t17.4\t5.8\n\
    23\t17.8\t0\t12.2\t14.1\n\
    22.6\t17.4\t12.2\t0\t15\n\
    2\t5.8\t14.1\t15\t0\n";

/// Three observations over four named columns.
pub(super) const OBSERVATIONS: &str = "sample\tw\tx\ty\tz\n\
    r1\t1\t0\t0\t0\n\
    r2\t0\t3\t4\t0\n\
    r3\t1\t0\t0\t2\n";

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_table(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

pub(super) fn linkage(method: LinkageMethod, optimize: bool) -> LinkageArgs {
    LinkageArgs {
        method,
        optimize,
        ignore_threshold: 0,
    }
}

pub(super) fn metric(metric: DistanceMetric, transpose: bool) -> MetricArgs {
    MetricArgs { metric, transpose }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
