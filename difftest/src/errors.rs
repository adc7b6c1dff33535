// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use difftest_runner::{errors::*, exit_codes::DifftestExitCode};
use owo_colors::OwoColorize;
use std::{error::Error, path::PathBuf};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that aborts a run before or while staging tests.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not read current directory")]
    GetCurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: PathBuf },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("tool lookup error")]
    ToolLookupError {
        #[from]
        err: ToolLookupError,
    },
    #[error("discovery error")]
    DiscoveryError {
        #[from]
        err: DiscoveryError,
    },
    #[error("staging error")]
    StagingError {
        #[from]
        err: StagingError,
    },
    #[error("building differential runner failed")]
    RunnerBuildError {
        #[from]
        err: RunnerBuildError,
    },
    #[error("stage log error")]
    StageLogError {
        #[from]
        err: StageLogError,
    },
    #[error("error writing report to output")]
    WriteOutputError {
        #[source]
        err: WriteReportError,
    },
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: WriteReportError) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::DiscoveryError {
                err: DiscoveryError::NoTestCases { .. },
            } => DifftestExitCode::NO_TEST_CASES,
            Self::GetCurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::ToolLookupError { .. }
            | Self::DiscoveryError { .. }
            | Self::StagingError { .. }
            | Self::RunnerBuildError { .. }
            | Self::StageLogError { .. } => DifftestExitCode::SETUP_ERROR,
            Self::WriteOutputError { .. } => DifftestExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::GetCurrentDirFailed { error } => {
                error!("could not read current directory");
                Some(error as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse difftest config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::ToolLookupError { err } => {
                error!("{err}");
                err.source()
            }
            Self::DiscoveryError { err } => {
                match err {
                    DiscoveryError::NoTestCases { .. } => {
                        error!("{}", err.style(styles.warning_text));
                    }
                    DiscoveryError::InputInsideOutputDir { path, output_dir } => {
                        error!(
                            "input `{}` is within the output directory `{output_dir}`",
                            path.style(styles.bold),
                        );
                        error!(
                            target: NO_HEADING_TARGET,
                            "(the output directory is wiped at the start of every run)",
                        );
                    }
                    _ => error!("{err}"),
                }
                err.source()
            }
            Self::StagingError { err } => {
                error!("{err}");
                err.source()
            }
            Self::RunnerBuildError { err } => {
                error!("failed to build differential runner");
                Some(err as &dyn Error)
            }
            Self::StageLogError { err } => {
                error!("failed to write stage log `{}`", err.path.style(styles.bold));
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("failed to write report to output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let no_tests = ExpectedError::from(DiscoveryError::NoTestCases {
            paths: vec!["tests".into()],
        });
        assert_eq!(no_tests.process_exit_code(), DifftestExitCode::NO_TEST_CASES);

        let inside = ExpectedError::from(DiscoveryError::InputInsideOutputDir {
            path: "out/a/input.c".into(),
            output_dir: "out".into(),
        });
        assert_eq!(inside.process_exit_code(), DifftestExitCode::SETUP_ERROR);

        let write = ExpectedError::write_output_error(WriteReportError::Io(
            std::io::ErrorKind::BrokenPipe.into(),
        ));
        assert_eq!(
            write.process_exit_code(),
            DifftestExitCode::WRITE_OUTPUT_ERROR
        );
    }
}
