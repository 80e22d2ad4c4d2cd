// src/loader.rs
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Diagnostic, DiagnosticSink, TriviaError};
use crate::question_store::{Snapshot, SnapshotBuilder};
use crate::record::{parse_line, Rejection};

/// Which inputs a load reads, and how.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    paths: Vec<PathBuf>,
    extension: Option<String>,
    recursive: bool,
}

impl LoadOptions {
    /// At least one root is required; an empty list is rejected before any
    /// filesystem access happens.
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, TriviaError> {
        if paths.is_empty() {
            return Err(TriviaError::NoPaths);
        }

        Ok(LoadOptions {
            paths,
            extension: None,
            recursive: false,
        })
    }

    /// `".trivia"` and `"trivia"` are equivalent; an empty filter matches every file.
    pub fn with_extension(mut self, extension: &str) -> Self {
        let extension = extension.trim().trim_start_matches('.');
        self.extension = (!extension.is_empty()).then(|| format!(".{}", extension));
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Suffix match on the file name, so a file called just `.trivia` counts.
    pub fn matches(&self, path: &Path) -> bool {
        match &self.extension {
            None => true,
            Some(wanted) => path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(wanted.as_str())),
        }
    }
}

/// Reads every matching file under the configured roots into a fresh snapshot.
///
/// Nothing here is fatal: unreadable paths, malformed lines and duplicates are
/// handed to `sink` and the walk carries on with whatever is left.
pub fn load(options: &LoadOptions, sink: &mut dyn DiagnosticSink) -> Snapshot {
    let mut builder = SnapshotBuilder::default();
    let mut pending: VecDeque<PathBuf> = VecDeque::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    for root in &options.paths {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => pending.push_back(root.clone()),
            Ok(_) => {
                if options.matches(root) {
                    load_file(root, &mut builder, sink);
                }
            }
            Err(source) => sink.report(Diagnostic::Unreadable {
                path: root.clone(),
                source,
            }),
        }
    }

    while let Some(dir) = pending.pop_front() {
        // Symlinked directories can point back up the tree.
        let key = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
        if !visited.insert(key) {
            continue;
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(source) => {
                sink.report(Diagnostic::Unreadable { path: dir, source });
                continue;
            }
        };

        let mut children: Vec<PathBuf> = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(source) => sink.report(Diagnostic::Unreadable {
                    path: dir.clone(),
                    source,
                }),
            }
        }
        children.sort();

        for child in children {
            match fs::metadata(&child) {
                Ok(meta) if meta.is_dir() => {
                    if options.recursive {
                        pending.push_back(child);
                    } else {
                        debug!("Not descending into {} (recursion disabled)", child.display());
                    }
                }
                Ok(_) => {
                    if options.matches(&child) {
                        load_file(&child, &mut builder, sink);
                    }
                }
                Err(source) => sink.report(Diagnostic::Unreadable {
                    path: child,
                    source,
                }),
            }
        }
    }

    builder.build()
}

fn load_file(path: &Path, builder: &mut SnapshotBuilder, sink: &mut dyn DiagnosticSink) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(source) => {
            sink.report(Diagnostic::Unreadable {
                path: path.to_path_buf(),
                source,
            });
            return;
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    let mut added = 0usize;

    for (index, line) in text.lines().enumerate() {
        let record = match parse_line(line) {
            Ok(Some(record)) => record,
            Ok(None) => continue,
            Err(Rejection::FieldCount(fields)) => {
                sink.report(Diagnostic::Malformed {
                    path: path.to_path_buf(),
                    line: index + 1,
                    fields,
                });
                continue;
            }
        };

        match builder.insert(record) {
            Ok(_) => added += 1,
            Err(id) => sink.report(Diagnostic::Duplicate {
                path: path.to_path_buf(),
                line: index + 1,
                id,
            }),
        }
    }

    debug!("Loaded {} questions from {}", added, path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_list_is_rejected() {
        assert!(matches!(LoadOptions::new(Vec::new()), Err(TriviaError::NoPaths)));
    }

    #[test]
    fn extension_filter_ignores_leading_dot() {
        let dotted = LoadOptions::new(vec![PathBuf::from(".")]).unwrap().with_extension(".trivia");
        let bare = LoadOptions::new(vec![PathBuf::from(".")]).unwrap().with_extension("trivia");

        for options in [dotted, bare] {
            assert!(options.matches(Path::new("/q/general.trivia")));
            assert!(!options.matches(Path::new("/q/general.txt")));
            assert!(!options.matches(Path::new("/q/trivia")));
            assert!(!options.matches(Path::new("/q/general.trivia.bak")));
        }
    }

    #[test]
    fn dotfile_named_after_the_extension_matches() {
        let options = LoadOptions::new(vec![PathBuf::from(".")]).unwrap().with_extension("trivia");
        assert!(options.matches(Path::new("/q/.trivia")));
        assert!(options.matches(Path::new("/q/archive.old.trivia")));
        assert!(!options.matches(Path::new("/q/")));
    }

    #[test]
    fn empty_extension_matches_everything() {
        let options = LoadOptions::new(vec![PathBuf::from(".")]).unwrap().with_extension("");
        assert!(options.matches(Path::new("README")));
        assert!(options.matches(Path::new("a.txt")));
    }
}
