//! Run-level failures. Problems inside one kernel are diagnostics, not
//! errors; these abort the whole run. A parse failure is reported as
//! fatal diagnostics on the run report instead, so it can be rendered
//! against its source.

use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The input file could not be read.
    #[snafu(display("cannot read '{}': {source}", path.display()))]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An output directory could not be created.
    #[snafu(display("cannot create directory '{}': {source}", path.display()))]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A shader or manifest could not be written.
    #[snafu(display("cannot write '{}': {source}", path.display()))]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configuration file is present but malformed.
    #[snafu(display("invalid configuration '{}': {reason}", path.display()))]
    Config { path: PathBuf, reason: String },
}
