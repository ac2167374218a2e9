pub mod output;
pub mod walker;

pub use output::{create_writer, JsonWriter, OutputFormat, OutputWriter, TerminalWriter, Totals};
pub use walker::{find_input_files, FileWalker, INPUT_EXTENSIONS};

use crate::errors::{Error, Result};
use crate::tokens::{SourceFile, Token};
use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::file_system("Failed to read file", path, e))
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::file_system("Failed to write file", path, e))
}

/// Load one input file: PHP source is tokenized with the tree-sitter grammar, a
/// `.json` file is read as a token stream produced by an external tokenizer.
pub fn load_source_file(path: &Path) -> Result<SourceFile> {
    let id = path.display().to_string();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("php") => SourceFile::from_source(id, &read_file(path)?),
        Some("json") => {
            let tokens: Vec<Token> = serde_json::from_str(&read_file(path)?)?;
            SourceFile::new(id, tokens)
        }
        _ => Err(Error::UnsupportedInput(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_php_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.php");
        write_file(&path, "<?php $_POST;").unwrap();
        let file = load_source_file(&path).unwrap();
        assert!(file.tokens().iter().any(|t| t.content == "$_POST"));
        assert_eq!(file.id(), path.display().to_string());
    }

    #[test]
    fn test_load_json_token_dump_round_trips_parsed_stream() {
        let dir = TempDir::new().unwrap();
        let parsed = SourceFile::from_source("x", "<?php foo( $a );").unwrap();
        let path = dir.path().join("tokens.json");
        write_file(&path, &serde_json::to_string(parsed.tokens()).unwrap()).unwrap();

        let file = load_source_file(&path).unwrap();
        assert_eq!(file.tokens(), parsed.tokens());
    }

    #[test]
    fn test_load_rejects_inconsistent_json_and_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.json");
        write_file(
            &bad,
            r#"[{"index": 3, "kind": "variable", "content": "$a"}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_source_file(&bad),
            Err(Error::TokenStream { .. })
        ));

        let other = dir.path().join("notes.txt");
        write_file(&other, "hi").unwrap();
        assert!(matches!(
            load_source_file(&other),
            Err(Error::UnsupportedInput(_))
        ));
    }
}
