//! Utilities (source file loading, language detection).

use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

use crate::language::Language;

/// Read a source file and return its content as string.
pub fn read_source_file(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);

    if !path.exists() {
        bail!("Source file '{}' does not exist", file_path);
    }

    if !path.is_file() {
        bail!("'{}' is not a file", file_path);
    }

    fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file_path, e))
}

/// Guess the language from a file extension.
pub fn language_for_path(file_path: &str) -> Option<Language> {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "js" | "mjs" | "cjs" | "javascript" => Some(Language::JavaScript),
        "py" | "python" => Some(Language::Python),
        "java" => Some(Language::Java),
        "ts" | "typescript" => Some(Language::TypeScript),
        "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
        "kt" | "kts" | "kotlin" => Some(Language::Kotlin),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path("main.py"), Some(Language::Python));
        assert_eq!(language_for_path("Main.JAVA"), Some(Language::Java));
        assert_eq!(language_for_path("code.javascript"), Some(Language::JavaScript));
        assert_eq!(language_for_path("a/b/app.kt"), Some(Language::Kotlin));
        assert_eq!(language_for_path("notes.txt"), None);
        assert_eq!(language_for_path("Makefile"), None);
    }

    #[test]
    fn test_read_missing_source() {
        assert!(read_source_file("definitely/missing/file.py").is_err());
    }

    #[test]
    fn test_read_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        fs::write(&path, "print(5)").unwrap();
        assert_eq!(read_source_file(path.to_str().unwrap()).unwrap(), "print(5)");
        assert!(read_source_file(dir.path().to_str().unwrap()).is_err());
    }
}
