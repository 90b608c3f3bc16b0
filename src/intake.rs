//! Collecting input PDFs from paths, glob patterns and directories

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use glob::glob;
use tracing::{debug, warn};
use crate::error::{Error, Result};

/// A PDF to process and the name it gets inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Relative archive entry name, `/`-separated
    pub name: String,
    /// Where to read the bytes from
    pub path: PathBuf,
}

impl InputFile {
    /// An input named after its file name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }

    /// Whether the name marks this as a PDF
    pub fn is_pdf(&self) -> bool {
        is_pdf_path(Path::new(&self.name))
    }

    /// Read the file contents
    pub fn read(&self) -> Result<Vec<u8>> {
        if !self.path.exists() {
            return Err(Error::FileNotFound(self.path.clone()));
        }
        Ok(fs::read(&self.path)?)
    }
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn is_glob_pattern(arg: &str) -> bool {
    arg.contains('*') || arg.contains('?') || arg.contains('[')
}

/// Join path components with `/` regardless of platform
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Expand one glob pattern into sorted paths
fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{}: {}", pattern, e)))?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => warn!(pattern, error = %e, "glob entry unreadable"),
        }
    }

    if paths.is_empty() {
        return Err(Error::NoFilesMatched(pattern.to_string()));
    }

    // Sort paths for consistent ordering
    paths.sort();
    Ok(paths)
}

/// Walk a directory recursively; files are named relative to the directory's parent
fn walk_directory(root: &Path) -> Result<Vec<InputFile>> {
    let base = root.parent().unwrap_or_else(|| Path::new(""));
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut children: Vec<PathBuf> = fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        children.sort();

        for child in children {
            if child.is_dir() {
                pending.push(child);
            } else {
                let relative = child.strip_prefix(base).unwrap_or(&child);
                files.push(InputFile {
                    name: entry_name(relative),
                    path: child.clone(),
                });
            }
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Resolve command-line arguments into the PDFs to process
///
/// Each argument is a file, a glob pattern or a directory. Argument order is
/// kept; matches within a glob or directory are sorted. Files that are not
/// PDFs are skipped.
pub fn collect_inputs(args: &[String]) -> Result<Vec<InputFile>> {
    let mut candidates = Vec::new();

    for arg in args {
        if is_glob_pattern(arg) {
            for path in expand_glob(arg)? {
                if path.is_dir() {
                    candidates.extend(walk_directory(&path)?);
                } else {
                    candidates.push(InputFile::from_path(path));
                }
            }
            continue;
        }

        let path = PathBuf::from(arg);
        if path.is_dir() {
            candidates.extend(walk_directory(&path)?);
        } else if path.exists() {
            candidates.push(InputFile::from_path(path));
        } else {
            return Err(Error::FileNotFound(path));
        }
    }

    let files = keep_pdfs(candidates);
    ensure_unique_names(&files)?;
    Ok(files)
}

/// Fail when two inputs would be stored under the same archive entry name
pub fn ensure_unique_names(files: &[InputFile]) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for file in files {
        if let Some(first) = seen.insert(&file.name, &file.path) {
            return Err(Error::DuplicateEntryName {
                name: file.name.clone(),
                first: first.to_path_buf(),
                second: file.path.clone(),
            });
        }
    }
    Ok(())
}

/// Drop anything that is not a PDF
pub fn keep_pdfs(files: Vec<InputFile>) -> Vec<InputFile> {
    files
        .into_iter()
        .filter(|file| {
            let keep = file.is_pdf();
            if !keep {
                debug!(name = %file.name, "skipping non-PDF input");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"%PDF-1.5\n").unwrap();
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let file = InputFile::from_path("/some/where/Report.PDF");
        assert_eq!(file.name, "Report.PDF");
        assert!(file.is_pdf());
        assert!(!InputFile::from_path("notes.txt").is_pdf());
    }

    #[test]
    fn test_literal_files_keep_argument_order() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("b.pdf");
        let a = dir.path().join("a.pdf");
        touch(&b);
        touch(&a);

        let inputs = collect_inputs(&[
            b.to_string_lossy().into_owned(),
            a.to_string_lossy().into_owned(),
        ])
        .unwrap();

        let names: Vec<_> = inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_directory_entries_are_relative_and_filtered() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("handouts");
        touch(&root.join("week2.pdf"));
        touch(&root.join("week1.pdf"));
        touch(&root.join("extra/appendix.pdf"));
        fs::write(root.join("readme.txt"), b"not a pdf").unwrap();

        let inputs = collect_inputs(&[root.to_string_lossy().into_owned()]).unwrap();

        let names: Vec<_> = inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["handouts/extra/appendix.pdf", "handouts/week1.pdf", "handouts/week2.pdf"]
        );
    }

    #[test]
    fn test_same_file_name_in_two_folders_rejected() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a/report.pdf");
        let second = dir.path().join("b/report.pdf");
        touch(&first);
        touch(&second);

        let result = collect_inputs(&[
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ]);

        match result {
            Err(Error::DuplicateEntryName { name, first: a, second: b }) => {
                assert_eq!(name, "report.pdf");
                assert_eq!(a, first);
                assert_eq!(b, second);
            }
            other => panic!("expected DuplicateEntryName, got {:?}", other),
        }
    }

    #[test]
    fn test_glob_over_folders_with_same_file_name_rejected() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a/report.pdf"));
        touch(&dir.path().join("b/report.pdf"));

        let pattern = format!("{}/*/report.pdf", dir.path().display());
        assert!(matches!(
            collect_inputs(&[pattern]),
            Err(Error::DuplicateEntryName { .. })
        ));
    }

    #[test]
    fn test_directories_with_same_file_name_are_distinct() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a/report.pdf"));
        touch(&dir.path().join("b/report.pdf"));

        let inputs = collect_inputs(&[
            dir.path().join("a").to_string_lossy().into_owned(),
            dir.path().join("b").to_string_lossy().into_owned(),
        ])
        .unwrap();

        let names: Vec<_> = inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a/report.pdf", "b/report.pdf"]);
    }

    #[test]
    fn test_glob_expansion_sorted() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2. second.pdf"));
        touch(&dir.path().join("1. first.pdf"));
        touch(&dir.path().join("cover.png"));

        let pattern = format!("{}/*", dir.path().display());
        let inputs = collect_inputs(&[pattern]).unwrap();

        let names: Vec<_> = inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["1. first.pdf", "2. second.pdf"]);
    }

    #[test]
    fn test_glob_without_matches() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.pdf", dir.path().display());
        assert!(matches!(collect_inputs(&[pattern]), Err(Error::NoFilesMatched(_))));
    }

    #[test]
    fn test_missing_literal_file() {
        let result = collect_inputs(&["does-not-exist.pdf".to_string()]);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_no_arguments_is_empty() {
        assert!(collect_inputs(&[]).unwrap().is_empty());
    }
}
