// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gives every test case its own working directory.

use crate::{
    discovery::{TestCase, TestList},
    errors::StagingError,
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// A test case copied into its own working directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StagedTest {
    name: String,
    work_dir: Utf8PathBuf,
}

impl StagedTest {
    /// The name of the test case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory every stage runs in. Only this test writes to it.
    pub fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }
}

/// The output directory, freshly emptied.
#[derive(Debug)]
pub struct StagingArea {
    output_dir: Utf8PathBuf,
    input_file_name: String,
}

impl StagingArea {
    /// Removes and recreates `output_dir`.
    ///
    /// `output_dir` must be absolute. Fails if `cwd` is inside it, since removing it would pull the
    /// current directory out from under the process.
    pub fn prepare(
        output_dir: &Utf8Path,
        input_file_name: &str,
        cwd: &Utf8Path,
    ) -> Result<Self, StagingError> {
        let canonical_output_dir = output_dir
            .canonicalize_utf8()
            .unwrap_or_else(|_| output_dir.to_owned());
        let canonical_cwd = cwd.canonicalize_utf8().unwrap_or_else(|_| cwd.to_owned());
        if canonical_cwd.starts_with(&canonical_output_dir) {
            return Err(StagingError::CwdInsideOutputDir {
                output_dir: output_dir.to_owned(),
            });
        }

        if output_dir.exists() {
            debug!("removing previous output directory `{output_dir}`");
            std::fs::remove_dir_all(output_dir).map_err(|error| StagingError::RemoveDir {
                path: output_dir.to_owned(),
                error,
            })?;
        }
        create_dir_all(output_dir)?;

        Ok(Self {
            output_dir: output_dir.to_owned(),
            input_file_name: input_file_name.to_owned(),
        })
    }

    /// The output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Copies a single test case into `<output_dir>/<name>/<input file name>`.
    pub fn stage(&self, test_case: &TestCase) -> Result<StagedTest, StagingError> {
        let work_dir = self.output_dir.join(test_case.name());
        create_dir_all(&work_dir)?;

        let to = work_dir.join(&self.input_file_name);
        std::fs::copy(test_case.source_path(), &to).map_err(|error| StagingError::Copy {
            from: test_case.source_path().to_owned(),
            to: to.clone(),
            error,
        })?;

        Ok(StagedTest {
            name: test_case.name().to_owned(),
            work_dir,
        })
    }

    /// Stages every test case, in order. Stops at the first failure.
    pub fn stage_all(&self, test_list: &TestList) -> Result<Vec<StagedTest>, StagingError> {
        test_list
            .iter()
            .map(|test_case| self.stage(test_case))
            .collect()
    }
}

fn create_dir_all(path: &Utf8Path) -> Result<(), StagingError> {
    std::fs::create_dir_all(path).map_err(|error| StagingError::CreateDir {
        path: path.to_owned(),
        error,
    })
}
