use crate::errors::{Error, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extensions the checker can read: PHP source, or token streams dumped as JSON.
pub const INPUT_EXTENSIONS: &[&str] = &["php", "json"];

pub struct FileWalker {
    root: PathBuf,
    ignore_patterns: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    /// Patterns match either the full path or the path relative to the root.
    /// Invalid patterns are skipped.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        self.ignore_patterns = patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();
        self
    }

    /// Matching files under the root, in a stable order. A root that is itself
    /// a file is returned as is.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| Error::FileSystem {
                message: e.to_string(),
                path: Some(self.root.clone()),
                source: None,
            })?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext_str = ext.to_string_lossy();
        if !INPUT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(&ext_str)) {
            return false;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches_path(relative))
    }
}

/// Expand every path argument into the input files beneath it.
pub fn find_input_files(paths: &[PathBuf], ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.exists() {
            return Err(Error::file_system(
                "path does not exist",
                path,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        let found = FileWalker::new(path.clone())
            .with_ignore_patterns(ignore_patterns)
            .walk()?;
        files.extend(found);
    }
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "<?php").unwrap();
    }

    #[test]
    fn test_walk_picks_php_and_json_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.php");
        touch(dir.path(), "inc/b.PHP");
        touch(dir.path(), "tokens.json");
        touch(dir.path(), "readme.md");

        let files = FileWalker::new(dir.path().to_path_buf()).walk().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["a.php", "inc/b.PHP", "tokens.json"]);
    }

    #[test]
    fn test_ignore_patterns_exclude_matches() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep.php");
        touch(dir.path(), "vendor/lib.php");

        touch(dir.path(), "node_modules/x/y.json");

        for pattern in ["**/vendor/**", "vendor/**"] {
            let files = FileWalker::new(dir.path().to_path_buf())
                .with_ignore_patterns(&[pattern.to_string(), "node_modules/**".to_string()])
                .walk()
                .unwrap();
            assert_eq!(files.len(), 1, "{pattern}");
            assert!(files[0].ends_with("keep.php"));
        }
    }

    #[test]
    fn test_single_file_root_and_missing_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "one.php");
        let file = dir.path().join("one.php");

        let files = find_input_files(&[file.clone()], &[]).unwrap();
        assert_eq!(files, vec![file]);
        assert!(find_input_files(&[dir.path().join("missing")], &[]).is_err());
    }
}
