use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Directories and files the scanner never descends into or records
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: Option<&[String]>) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Load from .gitignore and .ignore
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // 2. Add defaults (global)
        let defaults = [
            // Build output and tool state
            ".git/", ".pchscope/", "target/", "node_modules/", "__pycache__/",
            ".vscode/", ".idea/", ".cache/",

            // Compiled artifacts
            "*.o", "*.obj", "*.a", "*.so", "*.dylib", "*.dll", "*.lib",
            "*.gch", "*.pch",
        ];

        for pattern in defaults {
            // Static patterns always parse
            builder.add_line(None, pattern).ok();
        }

        // 3. Add user config excludes
        if let Some(excludes) = extra_excludes {
            for pattern in excludes {
                if let Err(e) = builder.add_line(None, pattern) {
                    tracing::warn!("ignoring invalid exclude pattern '{}': {}", pattern, e);
                }
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_excludes() {
        let root = Path::new("/repo");
        let excludes = vec!["src/third_party/".to_string()];
        let filter = IgnoreFilter::new(root, Some(&excludes));

        assert!(filter.is_ignored(&root.join(".git"), true));
        assert!(filter.is_ignored(&root.join("src/pch.h.gch"), false));
        assert!(filter.is_ignored(&root.join("src/third_party"), true));
        assert!(!filter.is_ignored(&root.join("src/mongo"), true));
        assert!(!filter.is_ignored(&root.join("src/mongo/pch.h"), false));
    }
}
