// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use difftest_runner::{
    classify::EquivalenceOracle,
    compiler::Toolchain,
    config::{DifftestConfig, TestThreads},
    discovery::TestList,
    errors::WriteReportError,
    exit_codes::DifftestExitCode,
    reporter::{
        JunitFormatter, OutcomeFormatter, RecordFormatter, RunReport, TableFormatter,
        TestReporterBuilder,
    },
    runner::DifferentialRunnerBuilder,
    staging::StagingArea,
};
use std::io::{BufWriter, Write};
use tracing::{info, warn};

/// Differential testing for compilers.
///
/// Every test program is compiled, linked and run with both a reference compiler and a candidate
/// compiler. A test passes if both pipelines fail at the same stage, or if both executables behave
/// the same.
#[derive(Debug, Parser)]
#[command(version, name = "difftest", styles = clap_styles::style(), max_term_width = 100)]
pub struct DifftestApp {
    /// Test programs, or directories searched recursively for them
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<Utf8PathBuf>,

    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    runner_opts: RunnerOpts,

    #[command(flatten)]
    report_opts: ReportOpts,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: .config/difftest.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// The candidate compiler [default: from the config]
    #[arg(long, short, value_name = "PATH")]
    candidate: Option<Utf8PathBuf>,

    /// Directory test cases are staged into, wiped at the start of each run
    /// [default: <candidate name>-test-output]
    #[arg(long, short, value_name = "DIR")]
    output_dir: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self, cwd: &Utf8Path) -> Result<DifftestConfig> {
        Ok(DifftestConfig::from_sources(
            cwd,
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Runner options")]
struct RunnerOpts {
    /// Number of tests to run simultaneously [possible values: integer or "num-cpus"]
    #[arg(long, short = 'j', value_name = "N", allow_negative_numbers = true)]
    test_threads: Option<TestThreads>,

    /// Kill any compile, link or execute stage that runs for longer than this (e.g. "10s")
    #[arg(long, value_name = "DURATION")]
    timeout: Option<humantime::Duration>,

    /// How executions are compared [possible values: exit-code, output]
    #[arg(long, value_name = "ORACLE")]
    oracle: Option<EquivalenceOracle>,
}

impl RunnerOpts {
    fn to_builder(
        &self,
        config: &DifftestConfig,
        oracle: EquivalenceOracle,
    ) -> DifferentialRunnerBuilder {
        let mut builder = DifferentialRunnerBuilder::default();
        builder
            .set_test_threads(self.test_threads.unwrap_or(config.test_threads()))
            .set_timeout(self.timeout.map_or(config.timeout(), Into::into))
            .set_oracle(oracle);
        builder
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Reporter options")]
struct ReportOpts {
    /// Only show failing tests in the results table
    #[arg(long, short)]
    fail_only: bool,

    /// Don't print the results table (the summary is still printed)
    #[arg(long)]
    no_table: bool,

    /// Don't write the timestamped record of this run
    #[arg(long)]
    no_record: bool,

    /// Write a JUnit XML report to the output directory
    #[arg(long)]
    junit: bool,

    /// Don't show the progress bar while tests run
    #[arg(long)]
    hide_progress_bar: bool,
}

impl DifftestApp {
    /// Initializes logging and color output.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        let cwd = current_dir()?;
        let config = self.config_opts.make_config(&cwd)?;

        let toolchain = Toolchain::resolve(
            config.reference(),
            config.candidate(),
            self.config_opts.candidate.as_deref(),
            config.linker(),
            &cwd,
        )?;

        let output_dir = match &self.config_opts.output_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.join(format!("{}-test-output", toolchain.candidate().name())),
        };

        let paths: Vec<_> = self.paths.iter().map(|path| cwd.join(path)).collect();
        let test_list = TestList::discover(&paths, config.source_extension(), &output_dir)?;

        let staging = StagingArea::prepare(&output_dir, config.input_file_name(), &cwd)?;
        let staged = staging.stage_all(&test_list)?;
        info!(
            "staged {} test cases into `{}`",
            staged.len(),
            staging.output_dir()
        );

        let oracle = self.runner_opts.oracle.unwrap_or(config.oracle());
        let runner = self
            .runner_opts
            .to_builder(&config, oracle)
            .build(&toolchain, config.input_file_name())?;

        let mut reporter = TestReporterBuilder::default()
            .set_verbose(output.verbose)
            .set_hide_progress_bar(self.report_opts.hide_progress_bar)
            .build();
        if output.color.should_colorize(supports_color::Stream::Stderr) {
            reporter.colorize();
        }

        let start_time = chrono::Local::now();
        let start = std::time::Instant::now();
        let outcomes = runner.execute(&staged, |event| reporter.report_event(event))?;
        let report = RunReport::new(&toolchain, oracle, &outcomes, start_time, start.elapsed());

        self.write_console_report(&report, output)?;

        if !self.report_opts.no_record {
            let record_dir = cwd.join(config.record_dir());
            match RecordFormatter.write_to_dir(&report, &record_dir) {
                Ok(path) => info!("wrote run record to `{path}`"),
                Err(error) => warn!("failed to write run record: {}", error_chain(&error)),
            }
        }

        if self.report_opts.junit || config.junit() {
            match JunitFormatter.write_to_dir(&report, staging.output_dir()) {
                Ok(path) => info!("wrote JUnit report to `{path}`"),
                Err(error) => warn!("failed to write JUnit report: {}", error_chain(&error)),
            }
        }

        Ok(DifftestExitCode::OK)
    }

    fn write_console_report(&self, report: &RunReport<'_>, output: OutputContext) -> Result<()> {
        let mut formatter = TableFormatter::new(self.report_opts.fail_only);
        if output.color.should_colorize(supports_color::Stream::Stdout) {
            formatter.colorize();
        }

        let mut writer = BufWriter::new(std::io::stdout());
        if self.report_opts.no_table {
            writer
                .write_all(formatter.render_summary(report).as_bytes())
                .map_err(|err| ExpectedError::write_output_error(WriteReportError::Io(err)))?;
        } else {
            formatter
                .write_report(report, &mut writer)
                .map_err(ExpectedError::write_output_error)?;
        }
        writer
            .flush()
            .map_err(|err| ExpectedError::write_output_error(WriteReportError::Io(err)))
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|error| ExpectedError::GetCurrentDirFailed { error })?;
    Utf8PathBuf::try_from(cwd).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 {
        path: err.into_path_buf(),
    })
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
