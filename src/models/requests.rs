//! Request Validation
//!
//! Validates file paths received by the HTTP layer.

use std::path::{Component, Path, PathBuf};

/// Maximum accepted length of a request path in bytes
pub const MAX_PATH_LENGTH: usize = 1024;

// == File Path ==
/// A request path that stays inside the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath {
    relative: PathBuf,
}

impl FilePath {
    /// Parses a path taken from the request URI.
    ///
    /// Returns an error message if validation fails.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("Path cannot be empty".to_string());
        }
        if raw.len() > MAX_PATH_LENGTH {
            return Err(format!(
                "Path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            ));
        }

        // Only normal parts are kept, so "./a.txt" and "a.txt" are one file
        let mut relative = PathBuf::new();
        for component in Path::new(raw).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => return Err(format!("Path '{}' must stay inside the data root", raw)),
            }
        }
        if relative.file_name().is_none() {
            return Err(format!("Path '{}' does not name a file", raw));
        }

        Ok(Self { relative })
    }

    /// Absolute location under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }

    /// Normalised relative path as text.
    pub fn display(&self) -> String {
        self.relative.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        let path = FilePath::parse("reports/2024/q1.csv").unwrap();
        assert_eq!(
            path.resolve(Path::new("/data")),
            PathBuf::from("/data/reports/2024/q1.csv")
        );
        assert!(FilePath::parse("a.bin").is_ok());
        assert!(FilePath::parse("./a.bin").is_ok());
    }

    #[test]
    fn test_equivalent_spellings_normalise() {
        let plain = FilePath::parse("docs/a.txt").unwrap();
        for raw in ["./docs/a.txt", "docs/./a.txt", "docs//a.txt", "docs/a.txt/"] {
            assert_eq!(FilePath::parse(raw).unwrap(), plain, "spelling {}", raw);
        }
        assert_eq!(plain.display(), "docs/a.txt");
    }

    #[test]
    fn test_current_dir_only_rejected() {
        assert!(FilePath::parse(".").is_err());
        assert!(FilePath::parse("./.").is_err());
    }

    #[test]
    fn test_empty_path() {
        assert!(FilePath::parse("").is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(FilePath::parse("../etc/passwd").is_err());
        assert!(FilePath::parse("a/../../b").is_err());
        assert!(FilePath::parse("/etc/passwd").is_err());
    }

    #[test]
    fn test_too_long() {
        let long = "x".repeat(MAX_PATH_LENGTH + 1);
        assert!(FilePath::parse(&long).is_err());
    }
}
