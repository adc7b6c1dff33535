// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    runner::StageStatus,
    test_output::{CapturedOutput, OutputAccumulator, collect_output},
};
use camino::Utf8Path;
use std::{
    process::Stdio,
    time::{Duration, Instant},
};
use tracing::debug;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        use unix as os;
    } else if #[cfg(windows)] {
        mod windows;
        use windows as os;
    } else {
        compile_error!("unsupported target platform");
    }
}

/// How long to keep reading output after the process exits, in case a grandchild inherited its
/// pipes.
const LEAK_TIMEOUT: Duration = Duration::from_millis(100);

/// A single external process invocation for a stage.
#[derive(Debug)]
pub(crate) struct StageCommand<'a> {
    program: &'a Utf8Path,
    args: Vec<String>,
    cwd: &'a Utf8Path,
}

/// The result of running a [`StageCommand`].
#[derive(Debug)]
pub(crate) struct ChildExecution {
    pub(crate) status: StageStatus,
    pub(crate) output: CapturedOutput,
    pub(crate) duration: Duration,
}

impl<'a> StageCommand<'a> {
    pub(crate) fn new(program: &'a Utf8Path, args: Vec<String>, cwd: &'a Utf8Path) -> Self {
        Self { program, args, cwd }
    }

    /// Runs the command, killing it if it takes longer than `timeout`.
    ///
    /// Failing to start the process isn't an error: the status is
    /// [`StageStatus::SpawnFailed`] and the reason is captured as output.
    pub(crate) async fn run(&self, timeout: Duration) -> ChildExecution {
        debug!(
            "running `{} {}` in `{}`",
            self.program,
            shell_words::join(&self.args),
            self.cwd
        );

        let start = Instant::now();
        let mut acc = OutputAccumulator::new();

        let (mut child, combined) = match self.spawn() {
            Ok(spawned) => spawned,
            Err(error) => {
                debug!("failed to spawn `{}`: {error}", self.program);
                acc.push_str(&format!("failed to spawn `{}`: {error}\n", self.program));
                return ChildExecution {
                    status: StageStatus::SpawnFailed,
                    output: acc.freeze(),
                    duration: start.elapsed(),
                };
            }
        };

        let mut timed_out = false;

        let res = {
            let collect = collect_output(combined, &mut acc);
            tokio::pin!(collect);
            let mut collect_done = false;

            let deadline = tokio::time::sleep(timeout);
            tokio::pin!(deadline);

            let res = loop {
                tokio::select! {
                    res = &mut collect, if !collect_done => {
                        collect_done = true;
                        if let Err(error) = res {
                            debug!("error reading output of `{}`: {error}", self.program);
                        }
                    }
                    res = child.wait() => {
                        break res;
                    }
                    () = &mut deadline, if !timed_out => {
                        debug!("`{}` timed out after {timeout:?}, killing it", self.program);
                        timed_out = true;
                        // The process may have exited in the meantime.
                        let _ = child.start_kill();
                    }
                }
            };

            if !collect_done {
                let _ = tokio::time::timeout(LEAK_TIMEOUT, &mut collect).await;
            }
            res
        };

        let status = match res {
            _ if timed_out => StageStatus::TimedOut,
            Ok(exit_status) => StageStatus::from_exit_status(exit_status),
            Err(error) => {
                acc.push_str(&format!("failed to wait for `{}`: {error}\n", self.program));
                StageStatus::SpawnFailed
            }
        };

        ChildExecution {
            status,
            output: acc.freeze(),
            duration: start.elapsed(),
        }
    }

    /// Spawns the child with stdout and stderr sharing a single pipe, so the captured output
    /// keeps the order the child wrote it in.
    fn spawn(&self) -> std::io::Result<(tokio::process::Child, tokio::fs::File)> {
        let (reader, writer) = std::io::pipe()?;

        let mut cmd = tokio::process::Command::new(self.program);
        cmd.args(&self.args)
            .current_dir(self.cwd)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);
        let child = cmd.spawn()?;
        // The command holds on to the write ends: drop it so reads see EOF once the child exits.
        drop(cmd);

        Ok((child, os::pipe_reader_to_file(reader).into()))
    }
}
