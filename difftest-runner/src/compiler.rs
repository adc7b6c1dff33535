// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The external tools a run drives: two compilers and a linker.

use crate::{
    config::{CandidateConfig, LinkerConfig, ReferenceConfig},
    errors::ToolLookupError,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::{ffi::OsStr, fmt};

/// The part an external tool plays in a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToolRole {
    /// The trusted compiler.
    Reference,

    /// The compiler being tested.
    Candidate,

    /// The linker shared by both pipelines.
    Linker,
}

impl fmt::Display for ToolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("reference compiler"),
            Self::Candidate => f.write_str("candidate compiler"),
            Self::Linker => f.write_str("linker"),
        }
    }
}

/// Command-line arguments with `{input}` and `{output}` placeholders.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArgTemplate {
    args: Vec<String>,
}

impl ArgTemplate {
    /// Creates a new template.
    pub fn new(args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitutes the placeholders. A placeholder may appear anywhere inside an argument, e.g.
    /// `-o{output}`.
    pub fn expand(&self, input: &str, output: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", input).replace("{output}", output))
            .collect()
    }
}

/// A compiler whose output is compared.
#[derive(Clone, Debug)]
pub struct CompilerUnderTest {
    name: String,
    executable: Utf8PathBuf,
    flags: ArgTemplate,
}

impl CompilerUnderTest {
    /// The name, used for artifacts and report columns.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The absolute path to the executable.
    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    /// The argument template.
    pub fn flags(&self) -> &ArgTemplate {
        &self.flags
    }
}

/// The linker that turns assembly into an executable.
#[derive(Clone, Debug)]
pub struct LinkerTool {
    executable: Utf8PathBuf,
    flags: ArgTemplate,
}

impl LinkerTool {
    /// The absolute path to the executable.
    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }

    /// The argument template.
    pub fn flags(&self) -> &ArgTemplate {
        &self.flags
    }
}

/// The full set of tools for a run, with every executable located.
#[derive(Clone, Debug)]
pub struct Toolchain {
    reference: CompilerUnderTest,
    candidate: CompilerUnderTest,
    linker: LinkerTool,
}

impl Toolchain {
    /// Locates every tool, using the process's `PATH` for bare names.
    ///
    /// `candidate_path` overrides the path from the candidate config. Relative paths are resolved
    /// against `cwd`.
    pub fn resolve(
        reference: &ReferenceConfig,
        candidate: &CandidateConfig,
        candidate_path: Option<&Utf8Path>,
        linker: &LinkerConfig,
        cwd: &Utf8Path,
    ) -> Result<Self, ToolLookupError> {
        let search_path = std::env::var_os("PATH");
        Self::resolve_with_search_path(
            reference,
            candidate,
            candidate_path,
            linker,
            cwd,
            search_path.as_deref(),
        )
    }

    fn resolve_with_search_path(
        reference: &ReferenceConfig,
        candidate: &CandidateConfig,
        candidate_path: Option<&Utf8Path>,
        linker: &LinkerConfig,
        cwd: &Utf8Path,
        search_path: Option<&OsStr>,
    ) -> Result<Self, ToolLookupError> {
        let reference = CompilerUnderTest {
            name: validate_name(ToolRole::Reference, &reference.name)?,
            executable: find_executable(ToolRole::Reference, &reference.path, cwd, search_path)?,
            flags: ArgTemplate::new(&reference.args),
        };

        let path = candidate_path.unwrap_or(&candidate.path);
        let name = candidate
            .name
            .clone()
            .unwrap_or_else(|| path.file_stem().unwrap_or_default().to_owned());
        let candidate = CompilerUnderTest {
            name: validate_name(ToolRole::Candidate, &name)?,
            executable: find_executable(ToolRole::Candidate, path, cwd, search_path)?,
            flags: ArgTemplate::new(&candidate.args),
        };

        if reference.name == candidate.name {
            return Err(ToolLookupError::NameConflict {
                name: candidate.name,
            });
        }

        let linker = LinkerTool {
            executable: find_executable(ToolRole::Linker, &linker.path, cwd, search_path)?,
            flags: ArgTemplate::new(&linker.args),
        };

        Ok(Self {
            reference,
            candidate,
            linker,
        })
    }

    /// The reference compiler.
    pub fn reference(&self) -> &CompilerUnderTest {
        &self.reference
    }

    /// The candidate compiler.
    pub fn candidate(&self) -> &CompilerUnderTest {
        &self.candidate
    }

    /// The linker.
    pub fn linker(&self) -> &LinkerTool {
        &self.linker
    }
}

fn validate_name(role: ToolRole, name: &str) -> Result<String, ToolLookupError> {
    let reason = if name.is_empty() {
        "must not be empty"
    } else if name.contains(['/', '\\']) {
        "must not contain path separators"
    } else if name == "." || name == ".." {
        "must not be `.` or `..`"
    } else {
        return Ok(name.to_owned());
    };
    Err(ToolLookupError::InvalidName {
        role,
        name: name.to_owned(),
        reason,
    })
}

/// A path with a separator in it must point at an existing executable file. A bare name is looked
/// up in `search_path`, skipping files that can't be executed.
fn find_executable(
    role: ToolRole,
    path: &Utf8Path,
    cwd: &Utf8Path,
    search_path: Option<&OsStr>,
) -> Result<Utf8PathBuf, ToolLookupError> {
    if path.components().count() > 1 || path.is_absolute() {
        let resolved = cwd.join(path);
        return if !resolved.is_file() {
            Err(ToolLookupError::NotFound {
                role,
                path: path.to_owned(),
            })
        } else if !is_executable(&resolved) {
            Err(ToolLookupError::NotExecutable {
                role,
                path: path.to_owned(),
            })
        } else {
            Ok(resolved)
        };
    }

    let file_names = [
        path.as_str().to_owned(),
        format!("{path}{}", std::env::consts::EXE_SUFFIX),
    ];
    let dirs = search_path.map(std::env::split_paths).into_iter().flatten();
    for dir in dirs {
        // Non-UTF-8 PATH entries can't hold a tool we could name anyway.
        let Ok(dir) = Utf8PathBuf::from_path_buf(dir) else {
            continue;
        };
        let dir = cwd.join(dir);
        for file_name in &file_names {
            let candidate = dir.join(file_name);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }

    Err(ToolLookupError::NotOnPath {
        role,
        name: path.to_string(),
    })
}

fn is_executable(path: &Utf8Path) -> bool {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            path.metadata().is_ok_and(|metadata| {
                metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
            })
        } else {
            path.is_file()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn write_executable(path: &Utf8Path) {
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

        fn configs(candidate_name: Option<&str>) -> (ReferenceConfig, CandidateConfig, LinkerConfig) {
        (
            ReferenceConfig {
                name: "gcc".to_owned(),
                path: "cc".into(),
                args: vec!["-S".to_owned(), "-o".to_owned(), "{output}".to_owned()],
            },
            CandidateConfig {
                name: candidate_name.map(str::to_owned),
                path: "./compiler-wrapper.sh".into(),
                args: vec!["{output}".to_owned(), "{input}".to_owned()],
            },
            LinkerConfig {
                path: "cc".into(),
                args: vec!["-o".to_owned(), "{output}".to_owned(), "{input}".to_owned()],
            },
        )
    }

    #[test]
    fn expand_template() {
        let template = ArgTemplate::new(["-S", "-o{output}", "{input}", "--x={input}:{output}"]);
        assert_eq!(
            template.expand("input.c", "1_asm-gcc.s"),
            ["-S", "-o1_asm-gcc.s", "input.c", "--x=input.c:1_asm-gcc.s"]
        );
    }

    #[test]
    fn resolve_toolchain() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        write_executable(&bin.join("cc"));
        write_executable(&dir.path().join("compiler-wrapper.sh"));

        let (reference, candidate, linker) = configs(None);
        let toolchain = Toolchain::resolve_with_search_path(
            &reference,
            &candidate,
            None,
            &linker,
            dir.path(),
            Some(bin.as_os_str()),
        )
        .expect("all tools exist");

        assert_eq!(toolchain.reference().name(), "gcc");
        assert_eq!(toolchain.reference().executable(), bin.join("cc"));
        assert_eq!(toolchain.candidate().name(), "compiler-wrapper");
        assert_eq!(
            toolchain.candidate().executable(),
            dir.path().join("./compiler-wrapper.sh")
        );
        assert_eq!(toolchain.linker().executable(), bin.join("cc"));
    }

    #[test]
    fn candidate_override_names_candidate() {
        let dir = tempdir().unwrap();
        write_executable(&dir.path().join("cc"));
        std::fs::create_dir(dir.path().join("build")).unwrap();
        write_executable(&dir.path().join("build/mycc"));

        let (reference, candidate, linker) = configs(None);
        let toolchain = Toolchain::resolve_with_search_path(
            &reference,
            &candidate,
            Some(Utf8Path::new("build/mycc")),
            &linker,
            dir.path(),
            Some(dir.path().as_os_str()),
        )
        .unwrap();
        assert_eq!(toolchain.candidate().name(), "mycc");
    }

    #[test_case(None, Some("./missing.sh"), "cannot find candidate compiler at `./missing.sh`"; "missing candidate")]
    #[test_case(Some("gcc"), None, "reference and candidate compilers are both named `gcc` (set `candidate.name` in the config to disambiguate)"; "name conflict")]
    #[test_case(Some("a/b"), None, "invalid name `a/b` for candidate compiler: must not contain path separators"; "name with separator")]
    fn resolve_errors(candidate_name: Option<&str>, candidate_path: Option<&str>, message: &str) {
        let dir = tempdir().unwrap();
        write_executable(&dir.path().join("cc"));
        write_executable(&dir.path().join("compiler-wrapper.sh"));

        let (reference, candidate, linker) = configs(candidate_name);
        let error = Toolchain::resolve_with_search_path(
            &reference,
            &candidate,
            candidate_path.map(Utf8Path::new),
            &linker,
            dir.path(),
            Some(dir.path().as_os_str()),
        )
        .unwrap_err();
        assert_eq!(error.to_string(), message);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_tools() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let tool = dir.path().join("mycc");
        write_executable(&tool);
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();

        let error = find_executable(
            ToolRole::Candidate,
            Utf8Path::new("./mycc"),
            dir.path(),
            None,
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "candidate compiler at `./mycc` is not executable"
        );

        // A non-executable file on PATH is skipped in favor of a later executable one.
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        write_executable(&bin.join("mycc"));
        let search_path = std::env::join_paths([dir.path(), bin.as_path()]).unwrap();
        let found = find_executable(
            ToolRole::Candidate,
            Utf8Path::new("mycc"),
            dir.path(),
            Some(search_path.as_os_str()),
        )
        .unwrap();
        assert_eq!(found, bin.join("mycc"));
    }

    #[test]
    fn bare_name_not_on_path() {
        let dir = tempdir().unwrap();
        let error = find_executable(
            ToolRole::Linker,
            Utf8Path::new("no-such-linker"),
            dir.path(),
            Some(dir.path().as_os_str()),
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "cannot find linker `no-such-linker` on PATH"
        );
    }
}
