use crate::decl::framework::DEFAULT_DECLARATION_FILES;
use crate::emit::Toolchain;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_declaration_files() -> Vec<String> {
    DEFAULT_DECLARATION_FILES.iter().map(|s| s.to_string()).collect()
}

fn default_build_dir() -> String {
    ".pchscope/build".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PchConfig {
    /// Source root to scan; defaults to the current directory
    pub root: Option<String>,
    #[serde(default = "default_declaration_files")]
    pub declaration_files: Vec<String>,
    /// Extra gitignore-style patterns to skip while scanning
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub toolchain: Toolchain,
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Resolution worker threads; unset uses one per core
    pub jobs: Option<usize>,
}

impl Default for PchConfig {
    fn default() -> Self {
        Self {
            root: None,
            declaration_files: default_declaration_files(),
            exclude: Vec::new(),
            toolchain: Toolchain::default(),
            build_dir: default_build_dir(),
            jobs: None,
        }
    }
}

impl PchConfig {
    /// Build directory, relative paths taken from `root`
    pub fn build_dir_in(&self, root: &Path) -> PathBuf {
        let dir = Path::new(&self.build_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("pchscope.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<PchConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: PchConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &PchConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_build_dir(build_dir: &Path) -> anyhow::Result<()> {
    if !build_dir.as_os_str().is_empty() && !build_dir.exists() {
        std::fs::create_dir_all(build_dir)?;
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".pchscope/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
