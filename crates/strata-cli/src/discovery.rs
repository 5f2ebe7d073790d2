// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Finding source files below the input paths.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use tracing::warn;

/// Source files named by `paths`, sorted and without duplicates.
///
/// Directories are searched recursively; symlinks inside them are skipped to
/// avoid following cycles. A file given directly is kept only if its suffix
/// matches.
pub fn discover(paths: &[Utf8PathBuf], suffixes: &[String]) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            if has_suffix(path, suffixes) {
                files.push(path.clone());
            } else {
                warn!(file = %path, "skipping file without a source suffix");
            }
        } else if path.is_dir() {
            collect_recursive(path, suffixes, &mut files)?;
        } else {
            miette::bail!("Path '{path}' does not exist");
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn has_suffix(path: &Utf8Path, suffixes: &[String]) -> bool {
    path.extension()
        .is_some_and(|extension| suffixes.iter().any(|suffix| suffix == extension))
}

fn collect_recursive(
    dir: &Utf8Path,
    suffixes: &[String],
    files: &mut Vec<Utf8PathBuf>,
) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let Ok(entry_path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            warn!(path = ?entry.path(), "skipping non-UTF-8 path");
            continue;
        };

        if file_type.is_dir() {
            collect_recursive(&entry_path, suffixes, files)?;
        } else if file_type.is_file() && has_suffix(&entry_path, suffixes) {
            files.push(entry_path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn php() -> Vec<String> {
        vec!["php".to_string()]
    }

    fn tree(files: &[&str]) -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "<?php").unwrap();
        }
        (temp, root)
    }

    #[test]
    fn directories_are_searched_recursively_and_sorted() {
        let (_temp, root) = tree(&["src/b.php", "src/a/c.php", "src/a.php", "README.md"]);
        let files = discover(&[root.clone()], &php()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(&root).unwrap().as_str().to_string())
            .collect();
        assert_eq!(relative, vec!["src/a/c.php", "src/a.php", "src/b.php"]);
    }

    #[test]
    fn overlapping_inputs_are_deduplicated() {
        let (_temp, root) = tree(&["a.php"]);
        let files = discover(&[root.clone(), root.join("a.php")], &php()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn custom_suffixes() {
        let (_temp, root) = tree(&["a.php", "b.inc", "c.txt"]);
        let files = discover(&[root], &["inc".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].as_str().ends_with("b.inc"));
    }

    #[test]
    fn direct_file_with_other_suffix_is_skipped() {
        let (_temp, root) = tree(&["notes.txt"]);
        assert!(discover(&[root.join("notes.txt")], &php()).unwrap().is_empty());
    }

    #[test]
    fn missing_path_is_an_error() {
        let (_temp, root) = tree(&[]);
        assert!(discover(&[root.join("missing")], &php()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let (_temp, root) = tree(&["src/a.php"]);
        std::os::unix::fs::symlink(root.join("src"), root.join("loop")).unwrap();
        let files = discover(&[root], &php()).unwrap();
        assert_eq!(files.len(), 1);
    }
}
