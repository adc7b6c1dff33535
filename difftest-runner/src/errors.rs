// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by difftest.

use crate::compiler::ToolRole;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse difftest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<ConfigError>),

    /// A key was present but its value is not usable.
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue {
        /// The key with the invalid value.
        key: &'static str,

        /// A description of what's wrong with the value.
        message: String,
    },
}

/// An error that occurs while parsing a
/// [`TestThreads`](crate::config::TestThreads) value from a string.
#[derive(Clone, Debug, Error)]
#[error("unrecognized value for test-threads: {input}")]
pub struct TestThreadsParseError {
    /// The input that failed to parse.
    pub input: String,
}

impl TestThreadsParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurs while parsing an
/// [`EquivalenceOracle`](crate::classify::EquivalenceOracle) value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for oracle: {input}\n(known values: {})",
    crate::classify::EquivalenceOracle::variants().join(", "),
)]
pub struct OracleParseError {
    input: String,
}

impl OracleParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while resolving input paths into test cases.
///
/// All of these are fatal: no test case is staged or run if discovery fails.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// A file was passed in directly, but it doesn't have the source extension.
    #[error("incorrect filename suffix (should be `.{extension}`): {path}")]
    IncorrectSuffix {
        /// The path that was passed in.
        path: Utf8PathBuf,

        /// The expected extension, without the leading dot.
        extension: String,
    },

    /// An input path is neither a file nor a directory.
    #[error("cannot read input path `{path}`")]
    CannotReadInput {
        /// The path that was passed in.
        path: Utf8PathBuf,
    },

    /// Walking a directory failed.
    #[error("error walking directory `{root}`")]
    Walk {
        /// The root of the walk.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },

    /// A discovered path is not valid UTF-8.
    #[error("path `{}` is not valid UTF-8", .path.display())]
    NonUtf8Path {
        /// The path.
        path: PathBuf,
    },

    /// A test case could not be opened for reading.
    #[error("cannot open `{path}` for reading")]
    Unreadable {
        /// The path to the source file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A test case lives inside the output directory, which is wiped at the start of a run.
    #[error("input `{path}` is within the output directory `{output_dir}`")]
    InputInsideOutputDir {
        /// The path to the source file.
        path: Utf8PathBuf,

        /// The output directory.
        output_dir: Utf8PathBuf,
    },

    /// No test cases were found.
    #[error("nothing to test: found no test-case in: {}", DisplayPaths(.paths.as_slice()))]
    NoTestCases {
        /// The input paths that were searched.
        paths: Vec<Utf8PathBuf>,
    },
}

/// An error that occurred while staging test cases into the output directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StagingError {
    /// The current directory is inside the output directory, which is about to be wiped.
    #[error("cannot run from within the output directory `{output_dir}`")]
    CwdInsideOutputDir {
        /// The output directory.
        output_dir: Utf8PathBuf,
    },

    /// Removing the output directory from a previous run failed.
    #[error("failed to remove previous output directory `{path}`")]
    RemoveDir {
        /// The directory being removed.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Creating a directory failed.
    #[error("failed to create directory `{path}`")]
    CreateDir {
        /// The directory being created.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Copying a source file into its working directory failed.
    #[error("failed to copy `{from}` to `{to}`")]
    Copy {
        /// The source file.
        from: Utf8PathBuf,

        /// The destination file.
        to: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error that occurred while locating an external tool.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolLookupError {
    /// The tool was specified as a path, and nothing executable exists there.
    #[error("cannot find {role} at `{path}`")]
    NotFound {
        /// The role the tool was going to play.
        role: ToolRole,

        /// The path that was looked up.
        path: Utf8PathBuf,
    },

    /// The tool was specified as a path, and the file there can't be executed.
    #[error("{role} at `{path}` is not executable")]
    NotExecutable {
        /// The role the tool was going to play.
        role: ToolRole,

        /// The path that was looked up.
        path: Utf8PathBuf,
    },

    /// The tool was specified as a bare name, and it isn't on `PATH`.
    #[error("cannot find {role} `{name}` on PATH")]
    NotOnPath {
        /// The role the tool was going to play.
        role: ToolRole,

        /// The name that was looked up.
        name: String,
    },

    /// A compiler name cannot be used to name artifacts.
    #[error("invalid name `{name}` for {role}: {reason}")]
    InvalidName {
        /// The role the tool was going to play.
        role: ToolRole,

        /// The name.
        name: String,

        /// Why the name is invalid.
        reason: &'static str,
    },

    /// The reference and candidate compilers have the same name, so their artifacts would
    /// collide.
    #[error(
        "reference and candidate compilers are both named `{name}` \
         (set `candidate.name` in the config to disambiguate)"
    )]
    NameConflict {
        /// The shared name.
        name: String,
    },
}

/// An error that occurred while creating a [`DifferentialRunner`](crate::runner::DifferentialRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerBuildError {
    /// An error occurred while creating the Tokio runtime.
    #[error("error creating Tokio runtime")]
    TokioRuntimeCreate(#[source] io::Error),
}

/// An error that occurred while persisting a stage log.
///
/// Stage logs are part of the staged test's working directory, so failing to write one is treated
/// the same way as a staging failure.
#[derive(Debug, Error)]
#[error("failed to write stage log `{path}`")]
pub struct StageLogError {
    /// The log file.
    pub path: Utf8PathBuf,

    /// The underlying error.
    #[source]
    pub error: io::Error,
}

/// An error that occurred while writing a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[source] io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// An error occurred while serializing JSON.
    #[error("error serializing record to JSON")]
    Json(#[source] serde_json::Error),

    /// An error occurred while producing JUnit XML.
    #[error("error serializing JUnit report")]
    Junit(#[source] quick_junit::SerializeError),
}

/// Displays a list of paths separated by spaces.
struct DisplayPaths<'a>(&'a [Utf8PathBuf]);

impl fmt::Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{path}")?;
        }
        Ok(())
    }
}
