// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves input paths into the list of test cases for a run.
//!
//! The main structure in this module is [`TestList`].

use crate::errors::DiscoveryError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::{collections::HashMap, fs::File};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A single source file to run through both compilers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    name: String,
    source_path: Utf8PathBuf,
}

impl TestCase {
    /// The name of the test case.
    ///
    /// This is the path relative to the directory it was found in (or just the file stem for
    /// files passed in directly), without the extension and with `/` as the separator. Distinct
    /// files that would share a name get as many of their parent directories prepended as it
    /// takes to tell them apart.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The location of the source file.
    pub fn source_path(&self) -> &Utf8Path {
        &self.source_path
    }
}

/// The deduplicated test cases for a run, sorted by name.
#[derive(Clone, Debug, Default)]
pub struct TestList {
    test_cases: Vec<TestCase>,
}

impl TestList {
    /// Resolves `paths` into test cases.
    ///
    /// Files must have the extension `extension`; directories are walked recursively and every
    /// file with that extension is picked up, skipping `output_dir` if it's inside the tree. The
    /// same file reached through several paths is only tested once.
    pub fn discover(
        paths: &[Utf8PathBuf],
        extension: &str,
        output_dir: &Utf8Path,
    ) -> Result<Self, DiscoveryError> {
        let mut collector = Collector::new(output_dir);

        for path in paths {
            let path: Utf8PathBuf = path.components().collect();
            if path.is_file() {
                if path.extension() != Some(extension) {
                    return Err(DiscoveryError::IncorrectSuffix {
                        path,
                        extension: extension.to_owned(),
                    });
                }
                let full_path = match path.parent() {
                    Some(parent) if !parent.as_str().is_empty() => {
                        canonical_dir(parent)?.join(path.file_name().unwrap_or_default())
                    }
                    _ => path.clone(),
                };
                collector.add(1, &full_path, path)?;
            } else if path.is_dir() {
                walk_dir(&path, extension, &mut collector)?;
            } else {
                return Err(DiscoveryError::CannotReadInput { path });
            }
        }

        let test_list = collector.into_test_list();
        if test_list.is_empty() {
            return Err(DiscoveryError::NoTestCases {
                paths: paths.to_vec(),
            });
        }
        Ok(test_list)
    }

    /// Returns the number of test cases.
    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    /// Returns true if there are no test cases.
    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }

    /// Iterates over the test cases in name order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TestCase> + '_ {
        self.test_cases.iter()
    }
}

fn walk_dir(
    root: &Utf8Path,
    extension: &str,
    collector: &mut Collector,
) -> Result<(), DiscoveryError> {
    let canonical_root = canonical_dir(root)?;
    let output_dir = collector.output_dir.clone();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            // The output directory from a previous run is about to be wiped.
            let skip = entry.depth() > 0
                && entry.file_type().is_dir()
                && entry
                    .path()
                    .canonicalize()
                    .is_ok_and(|canonical| canonical == output_dir.as_std_path());
            if skip {
                debug!("skipping output directory `{}`", entry.path().display());
            }
            !skip
        });

    for entry in walker {
        let entry = entry.map_err(|error| DiscoveryError::Walk {
            root: root.to_owned(),
            error,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = Utf8Path::from_path(entry.path()).ok_or_else(|| DiscoveryError::NonUtf8Path {
            path: entry.path().to_owned(),
        })?;
        if path.extension() != Some(extension) {
            continue;
        }

        // strip_prefix can't fail since walkdir yields paths under the root.
        let relative = path.strip_prefix(root).unwrap_or(path);
        collector.add(
            relative.components().count(),
            &canonical_root.join(relative),
            path.to_owned(),
        )?;
    }
    Ok(())
}

fn canonical_dir(dir: &Utf8Path) -> Result<Utf8PathBuf, DiscoveryError> {
    dir.canonicalize_utf8()
        .map_err(|error| DiscoveryError::Unreadable {
            path: dir.to_owned(),
            error,
        })
}

/// A test case before its final name is known.
struct Candidate {
    /// The components of the source's full path, with the extension stripped from the last one.
    components: Vec<String>,
    /// How many trailing components make up the name.
    depth: usize,
    source_path: Utf8PathBuf,
}

impl Candidate {
    fn name(&self) -> String {
        self.components[self.components.len() - self.depth..].join("/")
    }
}

struct Collector {
    output_dir: Utf8PathBuf,
    by_identity: HashMap<FileIdentity, Utf8PathBuf>,
    candidates: Vec<Candidate>,
}

impl Collector {
    fn new(output_dir: &Utf8Path) -> Self {
        // The output directory may not exist yet.
        let output_dir = output_dir
            .canonicalize_utf8()
            .unwrap_or_else(|_| output_dir.to_owned());
        Self {
            output_dir,
            by_identity: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    /// Adds a source file named by the last `depth` components of `full_path`.
    fn add(
        &mut self,
        depth: usize,
        full_path: &Utf8Path,
        path: Utf8PathBuf,
    ) -> Result<(), DiscoveryError> {
        let unreadable = |error| DiscoveryError::Unreadable {
            path: path.clone(),
            error,
        };
        let canonical = path.canonicalize_utf8().map_err(unreadable)?;
        if canonical.starts_with(&self.output_dir) {
            return Err(DiscoveryError::InputInsideOutputDir {
                path,
                output_dir: self.output_dir.clone(),
            });
        }

        let file = File::open(&path).map_err(unreadable)?;
        let identity = FileIdentity::new(&file, canonical).map_err(unreadable)?;

        if let Some(first) = self.by_identity.get(&identity) {
            warn!("`{path}` is the same file as `{first}`, skipping it");
            return Ok(());
        }

        let components: Vec<String> = full_path
            .with_extension("")
            .components()
            .filter_map(|component| match component {
                Utf8Component::Normal(component) => Some(component.to_owned()),
                _ => None,
            })
            .collect();
        let depth = depth.clamp(1, components.len().max(1));
        debug!("discovered `{path}`");
        self.by_identity.insert(identity, path.clone());
        self.candidates.push(Candidate {
            components,
            depth,
            source_path: path,
        });
        Ok(())
    }

    fn into_test_list(mut self) -> TestList {
        // Full paths are unique across distinct files, so this terminates: every round, each group
        // of candidates sharing a name has at most one member that can't grow any further.
        loop {
            let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
            for (index, candidate) in self.candidates.iter().enumerate() {
                by_name.entry(candidate.name()).or_default().push(index);
            }

            let mut renamed = false;
            for (name, indexes) in by_name {
                if indexes.len() < 2 {
                    continue;
                }
                for index in indexes {
                    let candidate = &mut self.candidates[index];
                    if candidate.depth < candidate.components.len() {
                        candidate.depth += 1;
                        debug!(
                            "`{}` shares the name `{name}`, renaming it to `{}`",
                            candidate.source_path,
                            candidate.name()
                        );
                        renamed = true;
                    }
                }
            }
            if !renamed {
                break;
            }
        }

        let mut test_cases: Vec<_> = self
            .candidates
            .into_iter()
            .map(|candidate| TestCase {
                name: candidate.name(),
                source_path: candidate.source_path,
            })
            .collect();
        test_cases.sort_by(|a, b| a.name.cmp(&b.name));
        TestList { test_cases }
    }
}

/// Identifies a file independently of the path it was reached through.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
enum FileIdentity {
    #[cfg(unix)]
    DevIno { dev: u64, ino: u64 },
    #[cfg_attr(unix, expect(dead_code))]
    Canonical(Utf8PathBuf),
}

impl FileIdentity {
    fn new(file: &File, canonical: Utf8PathBuf) -> std::io::Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(unix)] {
                use std::os::unix::fs::MetadataExt;

                let _ = canonical;
                let metadata = file.metadata()?;
                Ok(Self::DevIno {
                    dev: metadata.dev(),
                    ino: metadata.ino(),
                })
            } else {
                let _ = file;
                Ok(Self::Canonical(canonical))
            }
        }
    }
}
