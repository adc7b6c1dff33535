// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use difftest_runner::{
    classify::{EquivalenceOracle, Outcome},
    compiler::Toolchain,
    config::{CandidateConfig, LinkerConfig, ReferenceConfig, TestThreads},
    discovery::TestList,
    reporter::{OutcomeFormatter, RecordFormatter, RunReport, TestEvent},
    runner::DifferentialRunnerBuilder,
    staging::{StagedTest, StagingArea},
};
use indoc::indoc;
use std::{os::unix::fs::PermissionsExt, time::Duration};

pub(crate) const INPUT_FILE_NAME: &str = "input.c";

// Compilers "compile" by copying the source. Directives are shell comments so that the linked
// executable, which is the source run through /bin/sh, ignores them.
const REFERENCE_COMPILER: &str = indoc! {r#"
    #!/bin/sh
    if grep -q '^# reject' "$1"; then
        echo "refcc: error: invalid program" >&2
        exit 1
    fi
    cp "$1" "$2"
"#};

const CANDIDATE_COMPILER: &str = indoc! {r#"
    #!/bin/sh
    if grep -q '^# reject' "$1" && ! grep -q '^# candidate-accepts' "$1"; then
        echo "mycc: error: invalid program" >&2
        exit 1
    fi
    if grep -q '^# candidate-rejects' "$1"; then
        echo "mycc: internal compiler error" >&2
        exit 1
    fi
    cp "$1" "$2"
    if grep -q '^# miscompile' "$1"; then
        echo 'echo miscompiled' >> "$2"
    fi
    if grep -q '^# candidate-exit' "$1"; then
        echo 'exit 1' >> "$2"
    fi
    if grep -q '^# candidate-garbage' "$1"; then
        echo '# garbage' >> "$2"
    fi
"#};

const LINKER: &str = indoc! {r#"
    #!/bin/sh
    if grep -q '^# unlinkable' "$1" || grep -q '^# garbage' "$1"; then
        echo "ld: undefined reference to main" >&2
        exit 1
    fi
    { echo '#!/bin/sh'; cat "$1"; } > "$2"
    chmod +x "$2"
"#};

/// A scratch directory with fake compilers and a place for test sources.
pub(crate) struct Fixture {
    // Held for its drop.
    _dir: Utf8TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    pub(crate) fn new() -> Result<Self> {
        let dir = camino_tempfile::tempdir()?;
        // Canonicalize so that comparisons with canonicalized paths work on macOS.
        let root = dir.path().canonicalize_utf8()?;
        std::fs::create_dir_all(root.join("bin"))?;
        std::fs::create_dir_all(root.join("tests"))?;

        write_executable(&root.join("bin/refcc"), REFERENCE_COMPILER)?;
        write_executable(&root.join("bin/mycc"), CANDIDATE_COMPILER)?;
        write_executable(&root.join("bin/ld"), LINKER)?;

        Ok(Self { _dir: dir, root })
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(crate) fn tests_dir(&self) -> Utf8PathBuf {
        self.root.join("tests")
    }

    pub(crate) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("mycc-test-output")
    }

    /// Writes a test source under the tests directory.
    pub(crate) fn add_source(&self, rel_path: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.tests_dir().join(rel_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub(crate) fn toolchain(&self) -> Result<Toolchain> {
        let args = vec!["{input}".to_owned(), "{output}".to_owned()];
        let reference = ReferenceConfig {
            name: "refcc".to_owned(),
            path: self.root.join("bin/refcc"),
            args: args.clone(),
        };
        let candidate = CandidateConfig {
            name: None,
            path: self.root.join("bin/mycc"),
            args: args.clone(),
        };
        let linker = LinkerConfig {
            path: self.root.join("bin/ld"),
            args,
        };
        Ok(Toolchain::resolve(
            &reference,
            &candidate,
            None,
            &linker,
            &self.root,
        )?)
    }

    pub(crate) fn discover(&self) -> Result<TestList> {
        self.discover_paths(&[self.tests_dir()])
    }

    pub(crate) fn discover_paths(&self, paths: &[Utf8PathBuf]) -> Result<TestList> {
        Ok(TestList::discover(paths, "c", &self.output_dir())?)
    }

    pub(crate) fn stage(&self, test_list: &TestList) -> Result<Vec<StagedTest>> {
        let staging = StagingArea::prepare(&self.output_dir(), INPUT_FILE_NAME, &self.root)?;
        Ok(staging.stage_all(test_list)?)
    }

    /// Discovers, stages and runs everything under the tests directory.
    pub(crate) fn run(&self, opts: RunOpts) -> Result<RunResult> {
        self.run_paths(&[self.tests_dir()], opts)
    }

    pub(crate) fn run_paths(&self, paths: &[Utf8PathBuf], opts: RunOpts) -> Result<RunResult> {
        let toolchain = self.toolchain()?;
        let test_list = self.discover_paths(paths)?;
        let staged = self.stage(&test_list)?;

        let mut builder = DifferentialRunnerBuilder::default();
        builder
            .set_test_threads(opts.test_threads)
            .set_timeout(opts.timeout)
            .set_oracle(opts.oracle);
        let runner = builder.build(&toolchain, INPUT_FILE_NAME)?;

        let mut events = EventCounts::default();
        let outcomes = runner.execute(&staged, |event| events.record(&event))?;

        let report = RunReport::new(
            &toolchain,
            opts.oracle,
            &outcomes,
            chrono::Local::now(),
            Duration::ZERO,
        );
        let mut record = Vec::new();
        RecordFormatter.write_report(&report, &mut record)?;

        Ok(RunResult {
            outcomes,
            events,
            record: String::from_utf8(record)?,
        })
    }
}

fn write_executable(path: &Utf8Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RunOpts {
    pub(crate) test_threads: TestThreads,
    pub(crate) timeout: Duration,
    pub(crate) oracle: EquivalenceOracle,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            test_threads: TestThreads::Count(4),
            timeout: Duration::from_secs(10),
            oracle: EquivalenceOracle::Output,
        }
    }
}

#[derive(Debug)]
pub(crate) struct RunResult {
    pub(crate) outcomes: Vec<Outcome>,
    pub(crate) events: EventCounts,
    /// The durable record of the run, as JSON lines.
    pub(crate) record: String,
}

impl RunResult {
    pub(crate) fn outcome(&self, name: &str) -> &Outcome {
        self.outcomes
            .iter()
            .find(|outcome| outcome.test_name() == name)
            .unwrap_or_else(|| panic!("no outcome for test `{name}`"))
    }
}

#[derive(Debug, Default)]
pub(crate) struct EventCounts {
    pub(crate) run_started: usize,
    pub(crate) test_count: usize,
    pub(crate) finished: Vec<(usize, usize)>,
    pub(crate) run_finished: usize,
}

impl EventCounts {
    fn record(&mut self, event: &TestEvent<'_>) {
        match event {
            TestEvent::RunStarted { test_count, .. } => {
                self.run_started += 1;
                self.test_count = *test_count;
            }
            TestEvent::TestFinished {
                completed, total, ..
            } => {
                self.finished.push((*completed, *total));
            }
            TestEvent::RunFinished { .. } => {
                self.run_finished += 1;
            }
        }
    }
}
