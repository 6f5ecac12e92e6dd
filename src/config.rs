use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::exporter::ExportFormat;

/// Locale tags recognized when no config overrides them.
const DEFAULT_LOCALES: [&str; 2] = ["en_US", "zh_CN"];

/// Module whose default export is the localization function, by default.
const DEFAULT_MODULE: &str = "langutils";

/// Project configuration loaded from `.phrasebook.toml`.
/// Include/exclude patterns are path prefixes applied to scanned source files.
pub struct Config {
    exclude: Vec<String>,
    /// Root of the mirrored per-file catalog tree.
    pub export_dir: PathBuf,
    /// Single shared destination for the legacy append-mode export.
    pub export_file: Option<PathBuf>,
    /// Backend used for exports when no destination extension decides it.
    pub format: ExportFormat,
    include: Vec<String>,
    /// Locale tags accepted as an explicit last argument.
    pub locales: Vec<String>,
    /// Module whose default import names the localization function.
    pub module: String,
    /// Base directory for computing catalog-relative paths.
    pub source_root: PathBuf,
}

/// Raw TOML structure for `.phrasebook.toml`.
#[derive(serde::Deserialize)]
struct PhrasebookTomlConfig {
    #[serde(default)]
    exclude: Vec<String>,
    export_dir: Option<PathBuf>,
    export_file: Option<PathBuf>,
    format: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    locales: Option<Vec<String>>,
    module: Option<String>,
    source_root: Option<PathBuf>,
}

impl Config {
    /// Load config from `.phrasebook.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the
    /// file exists but is malformed — never silently falls back to defaults
    /// when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, or `Error::InvalidFormat`
    /// for an unrecognized format name.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".phrasebook.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: PhrasebookTomlConfig = toml::from_str(&content)?;
        let format = match raw.format {
            None => ExportFormat::Csv,
            Some(name) => ExportFormat::parse(&name)?,
        };

        Ok(Self {
            exclude: raw.exclude,
            export_dir: raw.export_dir.unwrap_or_else(|| PathBuf::from("locales")),
            export_file: raw.export_file,
            format,
            include: raw.include,
            locales: raw
                .locales
                .unwrap_or_else(|| DEFAULT_LOCALES.iter().map(|s| s.to_string()).collect()),
            module: raw.module.unwrap_or_else(|| DEFAULT_MODULE.to_string()),
            source_root: raw.source_root.unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// Defaults used when no config file exists.
    fn defaults() -> Self {
        Self {
            exclude: Vec::new(),
            export_dir: PathBuf::from("locales"),
            export_file: None,
            format: ExportFormat::Csv,
            include: Vec::new(),
            locales: DEFAULT_LOCALES.iter().map(|s| s.to_string()).collect(),
            module: DEFAULT_MODULE.to_string(),
            source_root: PathBuf::from("."),
        }
    }

    /// Whether a tag is a recognized explicit locale.
    /// Unrecognized tags are treated as absent, not as errors.
    pub fn is_locale(&self, tag: &str) -> bool {
        self.locales.iter().any(|l| l == tag)
    }

    /// Check whether a source file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        !self.exclude.iter().any(|p| relative_path.starts_with(p.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_scans_everything_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("src/app.js"));
        assert_eq!(config.module, "langutils");
        assert_eq!(config.format, ExportFormat::Csv);
        assert!(config.is_locale("zh_CN"));
        assert!(!config.is_locale("fr_FR"));
    }

    #[test]
    fn malformed_config_is_an_error_not_a_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".phrasebook.toml"), "module = [broken").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn include_and_exclude_are_prefix_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".phrasebook.toml"),
            "include = [\"src/\"]\nexclude = [\"src/vendor/\"]\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("src/app.js"));
        assert!(!config.should_scan("scripts/build.js"));
        assert!(!config.should_scan("src/vendor/lib.js"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".phrasebook.toml"), "format = \"xml\"\n").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(Error::InvalidFormat { .. })
        ));
    }
}
