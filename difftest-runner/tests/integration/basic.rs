// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use difftest_runner::{
    classify::{EquivalenceOracle, Verdict},
    config::TestThreads,
    errors::{DiscoveryError, ToolLookupError},
    reporter::RunStats,
    runner::StageStatus,
};
use pretty_assertions::assert_eq;
use std::{os::unix::fs::PermissionsExt, time::Duration};
use test_case::test_case;

fn add_mixed_sources(fixture: &Fixture) -> Result<()> {
    fixture.add_source("pass.c", "echo hello\n")?;
    fixture.add_source("invalid.c", "# reject\n")?;
    fixture.add_source("accepts_invalid.c", "# reject\n# candidate-accepts\necho x\n")?;
    fixture.add_source("ice.c", "# candidate-rejects\necho ok\n")?;
    fixture.add_source("miscompiled.c", "# miscompile\necho ok\n")?;
    fixture.add_source("garbage.c", "# candidate-garbage\necho ok\n")?;
    fixture.add_source("unlinkable.c", "# unlinkable\n")?;
    fixture.add_source("nested/exit3.c", "exit 3\n")?;
    fixture.add_source("wrong_exit.c", "# candidate-exit\n")?;
    Ok(())
}

#[test]
fn classifies_every_divergence() -> Result<()> {
    let fixture = Fixture::new()?;
    add_mixed_sources(&fixture)?;

    let result = fixture.run(RunOpts::default())?;

    let names: Vec<_> = result.outcomes.iter().map(|o| o.test_name()).collect();
    assert_eq!(
        names,
        [
            "accepts_invalid",
            "garbage",
            "ice",
            "invalid",
            "miscompiled",
            "nested/exit3",
            "pass",
            "unlinkable",
            "wrong_exit",
        ],
        "outcomes are sorted by name"
    );

    let expected = [
        ("accepts_invalid", Verdict::Fail, "compile", "candidate accepts an invalid program"),
        ("garbage", Verdict::Fail, "link", "candidate produces incorrect assembly"),
        ("ice", Verdict::Fail, "compile", "candidate rejects a valid program"),
        ("invalid", Verdict::Pass, "compile", ""),
        ("miscompiled", Verdict::Fail, "execute", "different results at execution"),
        ("nested/exit3", Verdict::Pass, "execute", ""),
        ("pass", Verdict::Pass, "execute", ""),
        ("unlinkable", Verdict::Pass, "link", "both fail to link"),
        ("wrong_exit", Verdict::Fail, "execute", "different results at execution"),
    ];
    for (name, verdict, stage, comment) in expected {
        let outcome = result.outcome(name);
        assert_eq!(outcome.verdict(), verdict, "verdict for {name}");
        assert_eq!(outcome.stage().as_str(), stage, "stage for {name}");
        assert_eq!(outcome.comment(), comment, "comment for {name}");
    }

    let exit3 = result.outcome("nested/exit3");
    assert_eq!(exit3.reference_status(), StageStatus::Exited(3));
    assert_eq!(exit3.candidate_status(), StageStatus::Exited(3));
    let wrong_exit = result.outcome("wrong_exit");
    assert_eq!(wrong_exit.reference_status(), StageStatus::Exited(0));
    assert_eq!(wrong_exit.candidate_status(), StageStatus::Exited(1));

    let stats = RunStats::from_outcomes(&result.outcomes);
    assert_eq!(stats.total, 9);
    assert_eq!(stats.passed, 4);
    assert_eq!(stats.failed(), 5);
    assert_eq!(stats.timed_out, 0);

    Ok(())
}

#[test]
fn events_are_reported_in_order() -> Result<()> {
    let fixture = Fixture::new()?;
    add_mixed_sources(&fixture)?;

    let result = fixture.run(RunOpts {
        test_threads: TestThreads::Count(3),
        ..Default::default()
    })?;

    assert_eq!(result.events.run_started, 1);
    assert_eq!(result.events.test_count, 9);
    assert_eq!(result.events.run_finished, 1);
    let completed: Vec<_> = result.events.finished.iter().map(|(c, _)| *c).collect();
    assert_eq!(completed, (1..=9).collect::<Vec<_>>());
    assert!(result.events.finished.iter().all(|(_, total)| *total == 9));

    Ok(())
}

#[test]
fn artifacts_and_logs_are_kept() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("pass.c", "echo hello\n")?;
    fixture.add_source("invalid.c", "# reject\n")?;

    fixture.run(RunOpts::default())?;

    let pass_dir = fixture.output_dir().join("pass");
    for file in [
        INPUT_FILE_NAME,
        "1_asm-refcc.s",
        "1_asm-mycc.s",
        "2_exe-refcc",
        "2_exe-mycc",
        "1_compile-refcc.txt",
        "2_link-refcc.txt",
        "3_execute-refcc.txt",
        "1_compile-mycc.txt",
        "2_link-mycc.txt",
        "3_execute-mycc.txt",
    ] {
        assert!(pass_dir.join(file).is_file(), "{file} exists in {pass_dir}");
    }
    let log = std::fs::read_to_string(pass_dir.join("3_execute-mycc.txt"))?;
    assert_eq!(log, "hello\n\nexit status: 0\n");

    let invalid_dir = fixture.output_dir().join("invalid");
    let log = std::fs::read_to_string(invalid_dir.join("1_compile-refcc.txt"))?;
    assert_eq!(log, "refcc: error: invalid program\n\nexit status: 1\n");
    for file in ["2_link-refcc.txt", "3_execute-refcc.txt", "2_exe-refcc"] {
        assert!(
            !invalid_dir.join(file).exists(),
            "{file} isn't produced after a failed compile"
        );
    }

    Ok(())
}

#[test_case(EquivalenceOracle::Output, Verdict::Fail ; "output oracle sees stdout")]
#[test_case(EquivalenceOracle::ExitCode, Verdict::Pass ; "exit code oracle ignores stdout")]
fn oracle_decides_execution(oracle: EquivalenceOracle, expected: Verdict) -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("miscompiled.c", "# miscompile\necho ok\n")?;

    let result = fixture.run(RunOpts {
        oracle,
        ..Default::default()
    })?;

    assert_eq!(result.outcome("miscompiled").verdict(), expected);
    Ok(())
}

#[test]
fn hanging_executables_time_out() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("hang.c", "sleep 30\n")?;
    fixture.add_source("quick.c", "echo done\n")?;

    let result = fixture.run(RunOpts {
        timeout: Duration::from_millis(500),
        ..Default::default()
    })?;

    let hang = result.outcome("hang");
    assert_eq!(hang.verdict(), Verdict::TimedOut);
    assert!(!hang.passed());
    assert_eq!(hang.stage().as_str(), "execute");
    assert_eq!(hang.comment(), "both executables timed out");
    assert_eq!(hang.reference_status(), StageStatus::TimedOut);

    assert_eq!(result.outcome("quick").verdict(), Verdict::Pass);

    let stats = RunStats::from_outcomes(&result.outcomes);
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.passed, 1);

    Ok(())
}

#[test]
fn rerun_replaces_previous_output() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("pass.c", "echo hello\n")?;
    fixture.run(RunOpts::default())?;

    let stale = fixture.output_dir().join("pass/stale.txt");
    std::fs::write(&stale, "left over")?;
    let source = fixture.tests_dir().join("pass.c");
    std::fs::remove_file(&source)?;
    fixture.add_source("other.c", "echo other\n")?;

    let result = fixture.run(RunOpts::default())?;

    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].test_name(), "other");
    assert!(!stale.exists(), "previous output directory was removed");

    Ok(())
}

#[test]
fn reruns_give_the_same_record() -> Result<()> {
    let fixture = Fixture::new()?;
    add_mixed_sources(&fixture)?;

    let first = fixture.run(RunOpts::default())?;
    let second = fixture.run(RunOpts {
        test_threads: TestThreads::Count(1),
        ..Default::default()
    })?;

    // The header carries the run id and timestamp, which change on every run.
    let rows = |record: &str| record.lines().skip(1).map(str::to_owned).collect::<Vec<_>>();
    assert_eq!(rows(&first.record).len(), 9);
    assert_eq!(rows(&first.record), rows(&second.record));
    Ok(())
}

#[test]
fn interleaved_stdout_and_stderr_compare_equal() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source(
        "chatty.c",
        "i=0\nwhile [ $i -lt 20 ]; do echo out$i; echo err$i >&2; i=$((i+1)); done\n",
    )?;

    for _ in 0..5 {
        let result = fixture.run(RunOpts::default())?;
        let outcome = result.outcome("chatty");
        assert_eq!(outcome.verdict(), Verdict::Pass, "{}", outcome.comment());
    }

    let log = std::fs::read_to_string(fixture.output_dir().join("chatty/3_execute-mycc.txt"))?;
    let expected: String = (0..20).map(|i| format!("out{i}\nerr{i}\n")).collect();
    assert_eq!(log, format!("{expected}\nexit status: 0\n"));
    Ok(())
}

#[test]
fn rerun_with_output_dir_inside_the_inputs() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("pass.c", "echo hello\n")?;
    let inputs = [fixture.root().to_owned()];

    for _ in 0..2 {
        let result = fixture.run_paths(&inputs, RunOpts::default())?;
        let names: Vec<_> = result.outcomes.iter().map(|o| o.test_name()).collect();
        assert_eq!(names, ["tests/pass"]);
        assert!(result.outcomes[0].passed());
    }
    assert!(
        fixture
            .output_dir()
            .join("tests/pass")
            .join(INPUT_FILE_NAME)
            .is_file()
    );
    Ok(())
}

#[test]
fn unrunnable_candidate_is_rejected_up_front() -> Result<()> {
    let fixture = Fixture::new()?;
    let candidate = fixture.root().join("bin/mycc");
    std::fs::set_permissions(&candidate, std::fs::Permissions::from_mode(0o644))?;

    let error = fixture
        .toolchain()
        .expect_err("a candidate without execute permission can't be used");
    let error = error
        .downcast_ref::<ToolLookupError>()
        .expect("error is a ToolLookupError");
    assert!(
        matches!(error, ToolLookupError::NotExecutable { .. }),
        "unexpected error: {error}"
    );
    Ok(())
}

#[test]
fn same_file_through_several_paths_runs_once() -> Result<()> {
    let fixture = Fixture::new()?;
    let pass = fixture.add_source("pass.c", "echo hello\n")?;
    fixture.add_source("other.c", "echo other\n")?;

    let test_list = difftest_runner::discovery::TestList::discover(
        &[fixture.tests_dir(), pass, fixture.tests_dir()],
        "c",
        &fixture.output_dir(),
    )?;

    let names: Vec<_> = test_list.iter().map(|t| t.name()).collect();
    assert_eq!(names, ["other", "pass"]);
    Ok(())
}

#[test]
fn empty_directory_has_no_test_cases() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.add_source("README.txt", "not a test\n")?;

    let error = fixture
        .discover()
        .expect_err("no .c files means nothing to test");
    let error = error
        .downcast_ref::<DiscoveryError>()
        .expect("error is a DiscoveryError");
    assert!(
        matches!(error, DiscoveryError::NoTestCases { .. }),
        "unexpected error: {error}"
    );
    assert!(
        fixture.root().join("tests").is_dir(),
        "discovery doesn't touch the tests directory"
    );
    Ok(())
}
