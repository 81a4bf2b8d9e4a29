//! Precompiled header emission
//!
//! Turns resolved include sets into what an external build step consumes:
//! the composed header text, the artifact path for the chosen toolchain,
//! the flags to build the PCH and to use it from a translation unit, and a
//! content fingerprint shared by identical compositions.
//!
//! Every directory under one scope composes the same set for a given mode,
//! so artifacts are keyed by (scope, mode):
//!
//! ```text
//! <build_dir>/<scope>/pch-<mode>.h          composed header
//! <build_dir>/<scope>/pch-<mode>.h.gch      gcc artifact
//! <build_dir>/<scope>/pch-<mode>.h.pch      clang artifact
//! ```

use crate::language::LanguageMode;
use crate::path::ScopePath;
use crate::scope::EffectiveIncludeSet;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Compiler family the PCH is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    #[default]
    Gcc,
    Clang,
    Msvc,
}

impl Toolchain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Toolchain::Gcc => "gcc",
            Toolchain::Clang => "clang",
            Toolchain::Msvc => "msvc",
        }
    }

    pub fn all() -> &'static [Toolchain] {
        &[Toolchain::Gcc, Toolchain::Clang, Toolchain::Msvc]
    }

    /// Suffix appended to the composed header to name the artifact
    pub fn pch_suffix(&self) -> Result<&'static str> {
        match self {
            Toolchain::Gcc => Ok(".gch"),
            Toolchain::Clang => Ok(".pch"),
            Toolchain::Msvc => Err(Error::UnsupportedToolchain(self.as_str().to_string())),
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Toolchain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gcc" | "g++" => Ok(Toolchain::Gcc),
            "clang" | "clang++" => Ok(Toolchain::Clang),
            "msvc" | "cl" => Ok(Toolchain::Msvc),
            _ => Err(Error::UnsupportedToolchain(s.to_string())),
        }
    }
}

/// Content hash of a composition; equal sets for the same mode share one
pub fn fingerprint(set: &EffectiveIncludeSet) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(set.mode.as_str().as_bytes());
    for include in &set.includes {
        hasher.update(b"\n");
        hasher.update(include.spelled().as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Composed header text for a resolved set
pub fn render_header(set: &EffectiveIncludeSet) -> String {
    let mut out = String::new();
    out.push_str("// Generated by pchscope. Do not edit.\n");
    if let Some(scope) = &set.scope {
        out.push_str(&format!("// scope: {}  mode: {}\n", scope, set.mode));
    }
    out.push_str("#pragma once\n\n");
    for include in &set.includes {
        out.push_str(&format!("#include {}\n", include.spelled()));
    }
    out
}

/// Paths and flags for one toolchain and build directory
#[derive(Debug, Clone)]
pub struct PchEmitter {
    toolchain: Toolchain,
    build_dir: PathBuf,
}

impl PchEmitter {
    /// Fails for toolchains without PCH support
    pub fn new(toolchain: Toolchain, build_dir: impl Into<PathBuf>) -> Result<Self> {
        toolchain.pch_suffix()?;
        Ok(Self {
            toolchain,
            build_dir: build_dir.into(),
        })
    }

    pub fn toolchain(&self) -> Toolchain {
        self.toolchain
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn header_path(&self, scope: &ScopePath, mode: LanguageMode) -> PathBuf {
        scope
            .to_fs_path(&self.build_dir)
            .join(format!("pch-{}.h", mode.as_str()))
    }

    pub fn artifact_path(&self, scope: &ScopePath, mode: LanguageMode) -> Result<PathBuf> {
        let header = self.header_path(scope, mode);
        let mut name = header.into_os_string();
        name.push(self.toolchain.pch_suffix()?);
        Ok(PathBuf::from(name))
    }

    /// Flags that compile the composed header into its artifact
    pub fn pch_build_flags(&self, scope: &ScopePath, mode: LanguageMode) -> Result<Vec<String>> {
        Ok(vec![
            "-x".to_string(),
            mode.header_language().to_string(),
            self.header_path(scope, mode).display().to_string(),
            "-o".to_string(),
            self.artifact_path(scope, mode)?.display().to_string(),
        ])
    }

    /// Flags a translation unit needs to use its PCH; empty without a scope
    pub fn unit_flags(&self, set: &EffectiveIncludeSet) -> Result<Vec<String>> {
        let Some(scope) = &set.scope else {
            return Ok(Vec::new());
        };
        let flags = match self.toolchain {
            Toolchain::Clang => vec![
                "-Winvalid-pch".to_string(),
                "-include-pch".to_string(),
                self.artifact_path(scope, set.mode)?.display().to_string(),
            ],
            Toolchain::Gcc => vec![
                "-Winvalid-pch".to_string(),
                "-include".to_string(),
                self.header_path(scope, set.mode).display().to_string(),
            ],
            Toolchain::Msvc => return Err(Error::UnsupportedToolchain(self.toolchain.to_string())),
        };
        Ok(flags)
    }

    /// Write the composed header, leaving it untouched when the text is unchanged.
    /// Returns whether the file was written.
    pub fn write_header(&self, set: &EffectiveIncludeSet) -> Result<bool> {
        let Some(scope) = &set.scope else {
            return Ok(false);
        };
        let path = self.header_path(scope, set.mode);
        let content = render_header(set);
        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
            tracing::debug!("{} is up to date", path.display());
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        tracing::debug!("wrote {}", path.display());
        Ok(true)
    }

    /// One entry per (scope, mode) over the given sets
    pub fn manifest<'a>(&self, sets: impl IntoIterator<Item = &'a EffectiveIncludeSet>) -> Result<PchManifest> {
        let mut entries: BTreeMap<(ScopePath, LanguageMode), ManifestEntry> = BTreeMap::new();
        for set in sets {
            let Some(scope) = &set.scope else {
                continue;
            };
            let key = (scope.clone(), set.mode);
            if let Some(entry) = entries.get_mut(&key) {
                entry.directories.push(set.directory.clone());
                continue;
            }
            let entry = ManifestEntry {
                scope: scope.clone(),
                mode: set.mode,
                header: self.header_path(scope, set.mode),
                artifact: self.artifact_path(scope, set.mode)?,
                fingerprint: fingerprint(set),
                includes: set.identifiers(),
                build_flags: self.pch_build_flags(scope, set.mode)?,
                directories: vec![set.directory.clone()],
            };
            entries.insert(key, entry);
        }
        Ok(PchManifest {
            toolchain: self.toolchain,
            build_dir: self.build_dir.clone(),
            entries: entries.into_values().collect(),
        })
    }
}

/// Machine-readable summary of every PCH a build needs
#[derive(Debug, Clone, Serialize)]
pub struct PchManifest {
    pub toolchain: Toolchain,
    pub build_dir: PathBuf,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub scope: ScopePath,
    pub mode: LanguageMode,
    pub header: PathBuf,
    pub artifact: PathBuf,
    pub fingerprint: String,
    pub includes: Vec<String>,
    pub build_flags: Vec<String>,
    /// Directories whose translation units use this PCH
    pub directories: Vec<ScopePath>,
}

impl PchManifest {
    /// Entries that can share one built artifact, keyed by fingerprint
    pub fn shared_artifacts(&self) -> BTreeMap<&str, Vec<&ManifestEntry>> {
        let mut groups: BTreeMap<&str, Vec<&ManifestEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups.entry(entry.fingerprint.as_str()).or_default().push(entry);
        }
        groups
    }
}
