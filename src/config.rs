use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use kyc_intake_core::duplicate::DEFAULT_NEAR_TOLERANCE;
use kyc_intake_core::matching::DEFAULT_EXCLUSION_WORDS;
use kyc_intake_core::{ExclusionVocabulary, MatchFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_root_prefix")]
    pub root_prefix: String,
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    #[serde(default = "default_summary_name")]
    pub summary_name: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            root_prefix: default_root_prefix(),
            archive_name: default_archive_name(),
            summary_name: default_summary_name(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join("Desktop"),
        None => PathBuf::from("."),
    }
}
fn default_root_prefix() -> String {
    "KYC docs".to_string()
}
fn default_archive_name() -> String {
    "kyc_documents_archive.zip".to_string()
}
fn default_summary_name() -> String {
    "document_summary.csv".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_exclusion_words")]
    pub exclusion_words: Vec<String>,
    #[serde(default = "default_true")]
    pub exclusions_enabled: bool,
    #[serde(default)]
    pub match_parent_dir: bool,
    #[serde(default = "default_near_tolerance")]
    pub near_duplicate_tolerance: u64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exclusion_words: default_exclusion_words(),
            exclusions_enabled: true,
            match_parent_dir: false,
            near_duplicate_tolerance: DEFAULT_NEAR_TOLERANCE,
        }
    }
}

fn default_exclusion_words() -> Vec<String> {
    DEFAULT_EXCLUSION_WORDS.iter().map(|w| w.to_string()).collect()
}
fn default_true() -> bool {
    true
}
fn default_near_tolerance() -> u64 {
    DEFAULT_NEAR_TOLERANCE
}

impl MatchingConfig {
    /// Build the match filter, honoring a per-request exclusion toggle.
    pub fn filter(&self, exclusions_enabled: bool) -> MatchFilter {
        let vocabulary = if exclusions_enabled {
            ExclusionVocabulary::new(&self.exclusion_words)
        } else {
            ExclusionVocabulary::empty()
        };
        MatchFilter::new(vocabulary).with_parent_dir_matching(self.match_parent_dir)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CollectConfig {
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl CollectConfig {
    pub fn exclude_set(&self) -> std::result::Result<GlobSet, globset::Error> {
        build_globset(&self.exclude_globs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl Config {
    /// Configuration used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Minimal configuration rooted at `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.workspace.base_dir = base_dir.into();
        config
    }

    pub fn archive_path(&self) -> PathBuf {
        self.workspace.base_dir.join(&self.workspace.archive_name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.workspace.base_dir.join(&self.workspace.summary_name)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let ws = &config.workspace;
    if ws.root_prefix.trim().is_empty() {
        anyhow::bail!("workspace.root_prefix must not be empty");
    }
    if ws.root_prefix.contains(['/', '\\']) {
        anyhow::bail!("workspace.root_prefix must not contain path separators");
    }
    for (key, name) in [
        ("workspace.archive_name", &ws.archive_name),
        ("workspace.summary_name", &ws.summary_name),
    ] {
        if !is_bare_file_name(name) {
            anyhow::bail!("{} must be a plain file name, got '{}'", key, name);
        }
    }

    if config
        .matching
        .exclusion_words
        .iter()
        .any(|w| w.trim().is_empty())
    {
        anyhow::bail!("matching.exclusion_words must not contain empty words");
    }

    config
        .collect
        .exclude_set()
        .with_context(|| "Invalid collect.exclude_globs")?;

    Ok(())
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name).file_name().map(|n| n == name).unwrap_or(false)
        && !name.contains(['/', '\\'])
}

fn build_globset(patterns: &[String]) -> std::result::Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kyc.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_tmp, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.workspace.root_prefix, "KYC docs");
        assert_eq!(cfg.matching.near_duplicate_tolerance, 1024);
        assert_eq!(
            cfg.matching.exclusion_words,
            vec!["ack", "of", "debt", "aod", "pensions"]
        );
        assert!(cfg.matching.exclusions_enabled);
        assert!(!cfg.matching.match_parent_dir);
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
    }

    #[test]
    fn test_full_config_parses() {
        let (_tmp, path) = write_config(
            r#"[workspace]
base_dir = "/tmp/kyc"
root_prefix = "Intake"
archive_name = "out.zip"
summary_name = "out.csv"

[matching]
exclusion_words = ["draft"]
match_parent_dir = true
near_duplicate_tolerance = 0

[collect]
follow_symlinks = true
exclude_globs = ["**/archive/**"]

[server]
bind = "0.0.0.0:8080"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.workspace.base_dir, PathBuf::from("/tmp/kyc"));
        assert_eq!(cfg.archive_path(), PathBuf::from("/tmp/kyc/out.zip"));
        assert_eq!(cfg.summary_path(), PathBuf::from("/tmp/kyc/out.csv"));
        assert_eq!(cfg.matching.exclusion_words, vec!["draft"]);
        assert!(cfg.collect.follow_symlinks);
        assert!(cfg.collect.exclude_set().unwrap().is_match("a/archive/x.pdf"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let (_tmp, path) = write_config("[workspace]\nroot_prefix = \"a/b\"\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) = write_config("[workspace]\narchive_name = \"../x.zip\"\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) = write_config("[matching]\nexclusion_words = [\" \"]\n");
        assert!(load_config(&path).is_err());

        let (_tmp, path) = write_config("[collect]\nexclude_globs = [\"a[\"]\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_filter_respects_exclusion_toggle() {
        let cfg = Config::minimal();
        let patterns = kyc_intake_core::SearchPatterns::new("Jane Doe", "123");
        assert!(!cfg.matching.filter(true).is_eligible(&patterns, "123 debt.pdf"));
        assert!(cfg.matching.filter(false).is_eligible(&patterns, "123 debt.pdf"));
    }
}
