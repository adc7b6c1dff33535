// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::Bytes;
use camino::Utf8PathBuf;
use serde::{Serialize, Serializer};
use std::{fmt, process::ExitStatus, time::Duration};

/// One of the three stages every compiler goes through for a test case.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StageKind {
    /// The compiler translates the staged source into assembly.
    Compile,

    /// The linker turns the assembly into an executable.
    Link,

    /// The executable is run.
    Execute,
}

impl StageKind {
    /// All stages, in the order they run.
    pub const ALL: [StageKind; 3] = [Self::Compile, Self::Link, Self::Execute];

    /// Returns the 1-based index of this stage, used as a prefix for artifact and log names.
    pub fn index(self) -> u8 {
        match self {
            Self::Compile => 1,
            Self::Link => 2,
            Self::Execute => 3,
        }
    }

    /// Returns the lowercase name of this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Link => "link",
            Self::Execute => "execute",
        }
    }

    /// Returns the file name of the log for this stage of the given compiler.
    pub fn log_file_name(self, compiler: &str) -> String {
        format!("{}_{}-{compiler}.txt", self.index(), self.as_str())
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the name of the assembly file the given compiler produces.
pub fn asm_file_name(compiler: &str) -> String {
    format!("{}_asm-{compiler}.s", StageKind::Compile.index())
}

/// Returns the name of the executable the linker produces from the given compiler's assembly.
pub fn exe_file_name(compiler: &str) -> String {
    format!(
        "{}_exe-{compiler}{}",
        StageKind::Link.index(),
        std::env::consts::EXE_SUFFIX
    )
}

/// The status of a single stage.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StageStatus {
    /// The stage did not run because an earlier stage failed.
    NotAttempted,

    /// The process exited with this code.
    Exited(i32),

    /// The process was terminated by this signal.
    Signaled(i32),

    /// The process ran for longer than the timeout and was killed.
    TimedOut,

    /// The process could not be started.
    SpawnFailed,
}

impl StageStatus {
    /// Returns true if the process exited with code 0.
    pub fn is_success(self) -> bool {
        self == Self::Exited(0)
    }

    /// Returns true if the process was killed because of a timeout.
    pub fn is_timed_out(self) -> bool {
        self == Self::TimedOut
    }

    /// Returns true if the process could not be started.
    pub fn is_spawn_failed(self) -> bool {
        self == Self::SpawnFailed
    }

    pub(crate) fn from_exit_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }

        // Neither an exit code nor a signal: only possible on exotic platforms.
        Self::Exited(-1)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAttempted => f.write_str("-"),
            Self::Exited(code) => write!(f, "{code}"),
            Self::Signaled(signal) => write!(f, "signal {signal}"),
            Self::TimedOut => f.write_str("timeout"),
            Self::SpawnFailed => f.write_str("spawn error"),
        }
    }
}

impl Serialize for StageStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The result of running a single stage.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// The stage.
    pub kind: StageKind,

    /// How the stage ended.
    pub status: StageStatus,

    /// Standard output and standard error, interleaved in arrival order.
    pub output: Bytes,

    /// The file the output was persisted to, or `None` if the stage was not attempted.
    pub log_path: Option<Utf8PathBuf>,

    /// How long the stage took.
    pub duration: Duration,
}

impl StageResult {
    /// Creates a result for a stage that was skipped.
    pub fn not_attempted(kind: StageKind) -> Self {
        Self {
            kind,
            status: StageStatus::NotAttempted,
            output: Bytes::new(),
            log_path: None,
            duration: Duration::ZERO,
        }
    }
}

/// The compile, link and execute stages for one compiler on one staged test.
///
/// Once a stage fails, the stages after it are [`StageStatus::NotAttempted`].
#[derive(Clone, Debug)]
pub struct PipelineRun {
    /// The name of the compiler that ran.
    pub compiler: String,

    /// The compile stage.
    pub compile: StageResult,

    /// The link stage.
    pub link: StageResult,

    /// The execute stage.
    pub execute: StageResult,
}

impl PipelineRun {
    /// Returns the result for the given stage.
    pub fn stage(&self, kind: StageKind) -> &StageResult {
        match kind {
            StageKind::Compile => &self.compile,
            StageKind::Link => &self.link,
            StageKind::Execute => &self.execute,
        }
    }
}
