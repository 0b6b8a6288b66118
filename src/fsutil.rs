//! Best-effort filesystem primitives.
//!
//! Absence is a normal outcome here: every lookup returns `false`, `None` or an
//! empty list instead of an I/O error.

use crate::types::ScanConfig;
use std::path::{Path, PathBuf};

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Read a file, replacing invalid UTF-8, or `None` when it cannot be read.
pub fn read_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read and parse a JSON file, or `None` when missing, empty or invalid.
pub fn read_json(path: &Path) -> Option<serde_json::Value> {
    let raw = read_text(path)?;
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(&raw).ok()
}

/// Names of the immediate subdirectories of `dir`, sorted.
pub fn list_subdirectories(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Posix-style path of `path` relative to `root`; `"."` for the root itself.
pub fn relative_posix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Every directory under `root` (inclusive), skipping names in `ignore`.
///
/// Iterative so that deep trees cannot blow the stack.
pub fn walk_directories(root: &Path, ignore: &[&str]) -> Vec<PathBuf> {
    let mut results = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        for name in list_subdirectories(&current).into_iter().rev() {
            if ignore.contains(&name.as_str()) {
                continue;
            }
            stack.push(current.join(name));
        }
        results.push(current);
    }
    results
}

/// Source files under `root`, bounded by `config.max_files`.
///
/// Files larger than `config.max_file_bytes` are skipped but still count
/// against the visit budget.
pub fn walk_source_files(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut visited = 0usize;
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                let skip = entry
                    .file_name()
                    .to_str()
                    .map(|name| config.skip_dirs.contains(&name))
                    .unwrap_or(true);
                if !skip {
                    stack.push(path);
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            if visited >= config.max_files {
                return files;
            }
            visited += 1;
            let is_source = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| config.source_extensions.contains(&ext))
                .unwrap_or(false);
            if !is_source {
                continue;
            }
            let small_enough = entry
                .metadata()
                .map(|m| m.len() <= config.max_file_bytes)
                .unwrap_or(false);
            if small_enough {
                files.push(path);
            }
        }
    }
    files
}

/// A script from `dir/package.json`, if declared.
pub fn package_script(dir: &Path, name: &str) -> Option<String> {
    let pkg = read_json(&dir.join("package.json"))?;
    pkg.get("scripts")?
        .get(name)?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn read_json_rejects_invalid() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("bad.json"), "{not json").unwrap();
        fs::write(root.join("empty.json"), "").unwrap();
        assert!(read_json(&root.join("bad.json")).is_none());
        assert!(read_json(&root.join("empty.json")).is_none());
        assert!(read_json(&root.join("missing.json")).is_none());
    }

    #[test]
    fn read_text_decodes_invalid_utf8_lossily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.txt");
        fs::write(&path, b"caf\xe9 test").unwrap();
        assert_eq!(read_text(&path).as_deref(), Some("caf\u{fffd} test"));
        assert!(read_text(&tmp.path().join("missing.txt")).is_none());
    }

    #[test]
    fn relative_posix_root_is_dot() {
        let root = Path::new("/repo");
        assert_eq!(relative_posix(root, root), ".");
        assert_eq!(relative_posix(root, &root.join("apps").join("web")), "apps/web");
    }

    #[test]
    fn walk_directories_skips_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::create_dir_all(root.join("node_modules/x")).unwrap();

        let dirs = walk_directories(root, &["node_modules"]);
        assert_eq!(dirs.len(), 3);
        assert!(!dirs.iter().any(|d| d.ends_with("x")));
    }

    #[test]
    fn walk_source_files_respects_caps() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        for i in 0..5 {
            fs::write(root.join(format!("src/f{}.ts", i)), "x").unwrap();
        }
        fs::write(root.join("node_modules/dep/index.js"), "x").unwrap();
        fs::write(root.join("src/big.py"), "x".repeat(64)).unwrap();
        fs::write(root.join("src/notes.txt"), "x").unwrap();

        let config = ScanConfig {
            max_file_bytes: 16,
            ..ScanConfig::default()
        };
        let files = walk_source_files(root, &config);
        assert_eq!(files.len(), 5);
        assert!(files.iter().all(|f| f.extension().unwrap() == "ts"));

        let config = ScanConfig {
            max_files: 2,
            ..ScanConfig::default()
        };
        assert!(walk_source_files(root, &config).len() <= 2);
    }

    #[test]
    fn package_script_lookup() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(
            root.join("package.json"),
            r#"{"scripts": {"lint": "eslint ."}}"#,
        )
        .unwrap();
        assert_eq!(package_script(root, "lint").as_deref(), Some("eslint ."));
        assert!(package_script(root, "test").is_none());
    }
}
