// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::TestThreads;
use crate::{
    classify::EquivalenceOracle,
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::BTreeSet, sync::LazyLock, time::Duration};
use tracing::warn;

/// Gets the number of available CPUs and caches the value.
#[inline]
pub fn get_num_cpus() -> usize {
    static NUM_CPUS: LazyLock<usize> =
        LazyLock::new(|| match std::thread::available_parallelism() {
            Ok(count) => count.into(),
            Err(err) => {
                warn!("unable to determine num-cpus ({err}), assuming 1 logical CPU");
                1
            }
        });

    *NUM_CPUS
}

/// Overall configuration for difftest.
///
/// Values that can also be passed in on the command line are overridden by the caller after the
/// config is read.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DifftestConfig {
    source_extension: String,
    input_file_name: String,
    oracle: EquivalenceOracle,
    #[serde(with = "humantime_serde")]
    timeout: Duration,
    test_threads: TestThreads,
    junit: bool,
    record_dir: Utf8PathBuf,
    reference: ReferenceConfig,
    candidate: CandidateConfig,
    linker: LinkerConfig,
}

impl DifftestConfig {
    /// The location of the per-directory config, relative to the current directory.
    pub const CONFIG_PATH: &'static str = ".config/difftest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Custom configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/difftest.toml`
    /// under `cwd`.
    ///
    /// An explicitly specified file must exist. If it isn't specified and `cwd` doesn't have
    /// `.config/difftest.toml`, the default config is used.
    pub fn from_sources(
        cwd: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = cwd.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            let keys = unknown.into_iter().collect::<Vec<_>>().join(", ");
            warn!("ignoring unknown configuration keys in `{config_file}`: {keys}");
        }

        config
            .validate()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        Ok(config)
    }

    /// Returns the source file extension, without a leading dot.
    pub fn source_extension(&self) -> &str {
        self.source_extension.trim_start_matches('.')
    }

    /// Returns the file name each staged test's source is copied to.
    pub fn input_file_name(&self) -> &str {
        &self.input_file_name
    }

    /// Returns the equivalence oracle used to compare executions.
    pub fn oracle(&self) -> EquivalenceOracle {
        self.oracle
    }

    /// Returns the per-stage timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of tests to run simultaneously.
    pub fn test_threads(&self) -> TestThreads {
        self.test_threads
    }

    /// Returns true if a JUnit report should be written.
    pub fn junit(&self) -> bool {
        self.junit
    }

    /// Returns the directory the durable record is written to, relative to the current directory.
    pub fn record_dir(&self) -> &Utf8Path {
        &self.record_dir
    }

    /// Returns the reference compiler configuration.
    pub fn reference(&self) -> &ReferenceConfig {
        &self.reference
    }

    /// Returns the candidate compiler configuration.
    pub fn candidate(&self) -> &CandidateConfig {
        &self.candidate
    }

    /// Returns the linker configuration.
    pub fn linker(&self) -> &LinkerConfig {
        &self.linker
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let config: Self = serde_ignored::deserialize(config, |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        })
        .map_err(|error| ConfigParseErrorKind::DeserializeError(Box::new(error)))?;

        Ok((config, ignored))
    }

    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        if self.source_extension().is_empty() {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "source-extension",
                message: "must not be empty".to_owned(),
            });
        }
        if self.input_file_name.is_empty()
            || self.input_file_name.contains(['/', '\\'])
            || self.input_file_name == "."
            || self.input_file_name == ".."
        {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "input-file-name",
                message: format!("`{}` is not a plain file name", self.input_file_name),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "timeout",
                message: "must be greater than zero".to_owned(),
            });
        }
        Ok(())
    }
}

/// Configuration for the reference compiler.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReferenceConfig {
    /// The name used for artifacts and report columns.
    pub name: String,

    /// A path to the compiler, or a bare name looked up on `PATH`.
    pub path: Utf8PathBuf,

    /// The argument template. `{input}` and `{output}` are substituted.
    pub args: Vec<String>,
}

/// Configuration for the candidate compiler.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CandidateConfig {
    /// The name used for artifacts and report columns. Defaults to the file stem of `path`.
    #[serde(default)]
    pub name: Option<String>,

    /// A path to the compiler, or a bare name looked up on `PATH`.
    pub path: Utf8PathBuf,

    /// The argument template. `{input}` and `{output}` are substituted.
    pub args: Vec<String>,
}

/// Configuration for the linker shared by both pipelines.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkerConfig {
    /// A path to the linker, or a bare name looked up on `PATH`.
    pub path: Utf8PathBuf,

    /// The argument template. `{input}` and `{output}` are substituted.
    pub args: Vec<String>,
}
