// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{PipelineRun, StageKind, StageResult, asm_file_name, exe_file_name};
use crate::{
    classify::{EquivalenceOracle, Outcome, classify},
    compiler::{CompilerUnderTest, Toolchain},
    config::TestThreads,
    errors::{RunnerBuildError, StageLogError},
    reporter::TestEvent,
    staging::StagedTest,
    test_command::StageCommand,
};
use camino::Utf8Path;
use future_queue::{FutureQueueContext, StreamExt};
use futures::prelude::*;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::debug;

/// Differential runner options.
#[derive(Debug, Default)]
pub struct DifferentialRunnerBuilder {
    test_threads: Option<TestThreads>,
    timeout: Option<Duration>,
    oracle: Option<EquivalenceOracle>,
}

impl DifferentialRunnerBuilder {
    /// The default per-stage timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Sets the number of test cases to run simultaneously.
    pub fn set_test_threads(&mut self, test_threads: TestThreads) -> &mut Self {
        self.test_threads = Some(test_threads);
        self
    }

    /// Sets the maximum amount of time a single stage may run for.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the oracle used to compare executions.
    pub fn set_oracle(&mut self, oracle: EquivalenceOracle) -> &mut Self {
        self.oracle = Some(oracle);
        self
    }

    /// Creates a new runner.
    ///
    /// `input_file_name` is the name staged sources were copied to within each working directory.
    pub fn build<'a>(
        self,
        toolchain: &'a Toolchain,
        input_file_name: &'a str,
    ) -> Result<DifferentialRunner<'a>, RunnerBuildError> {
        let test_threads = self.test_threads.unwrap_or(TestThreads::NumCpus).compute();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("difftest-runner-worker")
            .build()
            .map_err(RunnerBuildError::TokioRuntimeCreate)?;

        Ok(DifferentialRunner {
            toolchain,
            input_file_name,
            test_threads,
            timeout: self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT),
            oracle: self.oracle.unwrap_or_default(),
            runtime,
        })
    }
}

/// Runs staged tests through both compilers and classifies the results.
///
/// Created using [`DifferentialRunnerBuilder::build`].
#[derive(Debug)]
pub struct DifferentialRunner<'a> {
    toolchain: &'a Toolchain,
    input_file_name: &'a str,
    test_threads: usize,
    timeout: Duration,
    oracle: EquivalenceOracle,
    runtime: Runtime,
}

impl<'a> DifferentialRunner<'a> {
    /// Runs every staged test. The callback is called as tests finish.
    ///
    /// Returns the outcomes sorted by test name. Stops early, killing any running processes, if a
    /// stage log can't be written.
    pub fn execute<F>(self, tests: &[StagedTest], mut callback: F) -> Result<Vec<Outcome>, StageLogError>
    where
        F: FnMut(TestEvent<'_>),
    {
        let start = Instant::now();
        let total = tests.len();
        callback(TestEvent::RunStarted {
            test_count: total,
            test_threads: self.test_threads,
        });

        let this = &self;
        let res = self.runtime.block_on(async {
            let mut outcomes = Vec::with_capacity(total);
            // future_queue means tests are started in order but returned in any order.
            let mut finished = std::pin::pin!(
                stream::iter(
                    tests
                        .iter()
                        .map(|test| (1, move |_cx: FutureQueueContext| this.run_test(test)))
                )
                .future_queue(this.test_threads)
            );

            while let Some(res) = finished.next().await {
                let (outcome, reference, candidate) = res?;
                callback(TestEvent::TestFinished {
                    outcome: &outcome,
                    reference: &reference,
                    candidate: &candidate,
                    completed: outcomes.len() + 1,
                    total,
                });
                outcomes.push(outcome);
            }
            Ok::<_, StageLogError>(outcomes)
        });

        // Don't wait for stray grandchildren that may still hold on to blocking reads.
        self.runtime.shutdown_background();

        let mut outcomes = res?;
        outcomes.sort_by(|a, b| a.test_name().cmp(b.test_name()));
        callback(TestEvent::RunFinished {
            elapsed: start.elapsed(),
        });
        Ok(outcomes)
    }

    // ---
    // Helper methods
    // ---

    async fn run_test(
        &self,
        test: &StagedTest,
    ) -> Result<(Outcome, PipelineRun, PipelineRun), StageLogError> {
        let reference = self.run_pipeline(self.toolchain.reference(), test).await?;
        let candidate = self.run_pipeline(self.toolchain.candidate(), test).await?;
        let outcome = classify(test.name(), &reference, &candidate, self.oracle);
        debug!(
            "{}: {} at {} ({})",
            outcome.test_name(),
            outcome.verdict(),
            outcome.stage(),
            outcome.comment()
        );
        Ok((outcome, reference, candidate))
    }

    async fn run_pipeline(
        &self,
        compiler: &CompilerUnderTest,
        test: &StagedTest,
    ) -> Result<PipelineRun, StageLogError> {
        let asm = asm_file_name(compiler.name());
        let exe = exe_file_name(compiler.name());

        let compile = self
            .run_stage(
                StageKind::Compile,
                compiler.name(),
                compiler.executable(),
                compiler.flags().expand(self.input_file_name, &asm),
                test,
            )
            .await?;
        if !compile.status.is_success() {
            return Ok(PipelineRun {
                compiler: compiler.name().to_owned(),
                compile,
                link: StageResult::not_attempted(StageKind::Link),
                execute: StageResult::not_attempted(StageKind::Execute),
            });
        }

        let linker = self.toolchain.linker();
        let link = self
            .run_stage(
                StageKind::Link,
                compiler.name(),
                linker.executable(),
                linker.flags().expand(&asm, &exe),
                test,
            )
            .await?;
        if !link.status.is_success() {
            return Ok(PipelineRun {
                compiler: compiler.name().to_owned(),
                compile,
                link,
                execute: StageResult::not_attempted(StageKind::Execute),
            });
        }

        let execute = self
            .run_stage(
                StageKind::Execute,
                compiler.name(),
                &test.work_dir().join(&exe),
                Vec::new(),
                test,
            )
            .await?;

        Ok(PipelineRun {
            compiler: compiler.name().to_owned(),
            compile,
            link,
            execute,
        })
    }

    async fn run_stage(
        &self,
        kind: StageKind,
        compiler_name: &str,
        program: &Utf8Path,
        args: Vec<String>,
        test: &StagedTest,
    ) -> Result<StageResult, StageLogError> {
        let execution = StageCommand::new(program, args, test.work_dir())
            .run(self.timeout)
            .await;

        let log_path = test.work_dir().join(kind.log_file_name(compiler_name));
        let log = format!(
            "{}\nexit status: {}\n",
            execution.output.lossy(),
            execution.status
        );
        tokio::fs::write(&log_path, log)
            .await
            .map_err(|error| StageLogError {
                path: log_path.clone(),
                error,
            })?;

        Ok(StageResult {
            kind,
            status: execution.status,
            output: execution.output.buf,
            log_path: Some(log_path),
            duration: execution.duration,
        })
    }
}
