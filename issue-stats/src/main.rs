//! Recompute rolling issue and pull request statistics for registered packages.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use issue_stats_lib::{Host, run};
use std::io::{self, Write};

/// Host for the `issue-stats` binary: package update lines go to stdout, failures to stderr.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        io::stdout().lock()
    }

    fn error(&mut self) -> impl Write {
        io::stderr().lock()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut RealHost, std::env::args()).await
}
