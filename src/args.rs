//! Arguments.
//!
//! This module contains the definition for the available command-line parameter.

use clap::Parser;

#[derive(Debug, Parser)]
#[clap(author, about)]
pub(crate) struct Args {
    /// Sets a custom config file
    #[clap(short, long, value_name = "file")]
    pub(crate) config: Option<String>,
    /// Overrides the install directory
    #[clap(short, long, value_name = "dir")]
    pub(crate) directory: Option<String>,
    /// Use cached artifacts only and don't retry (same as AWS_CDK_OFFLINE=1)
    #[clap(long, action)]
    pub(crate) offline: bool,
    /// Install the AWS CDK again, even if it is present
    #[clap(long, action, conflicts_with_all = ["info", "license"])]
    pub(crate) install: bool,
    /// Print versions, platform and installation paths
    #[clap(long, action, conflicts_with = "license")]
    pub(crate) info: bool,
    /// Print the license notices
    #[clap(long, action)]
    pub(crate) license: bool,
    /// Suppress unnecessary information
    #[clap(short = 'q', long, action)]
    pub(crate) quiet: bool,
    /// Change level of verbosity (apply multiple times to increase level)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
    /// Print version information
    #[clap(short = 'V', long, action)]
    pub(crate) version: bool,
}
