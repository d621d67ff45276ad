//! Session Configuration
//!
//! Raw, serializable settings and the validated options the loader runs on.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Vocabulary size value meaning "not known in advance".
pub const UNKNOWN_VOCABULARY_SIZE: i64 = -1;

/// Default text encoding label for model files.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// How the first line of a model file is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Treat the first line as a header only if it looks like `<vocab> <dimension>`
    #[default]
    Auto,
    /// Always skip the first line
    Present,
    /// Never skip the first line
    Absent,
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(HeaderMode::Auto),
            "present" => Ok(HeaderMode::Present),
            "absent" => Ok(HeaderMode::Absent),
            other => Err(format!(
                "unknown header mode '{}' (expected auto, present or absent)",
                other
            )),
        }
    }
}

impl fmt::Display for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderMode::Auto => "auto",
            HeaderMode::Present => "present",
            HeaderMode::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Session settings as supplied by a caller or a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Path to the pretrained model file
    pub file_path: PathBuf,

    /// Text encoding label of the model file
    pub encoding: String,

    /// Known number of rows in the model (-1 = unknown, loads in two passes)
    pub vocabulary_size: i64,

    /// Width of every vector in the model
    pub vector_dimension: i64,

    /// Comma-separated word lists, one per group
    pub group_definitions: Vec<String>,

    /// Header line handling
    pub header: HeaderMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            vocabulary_size: UNKNOWN_VOCABULARY_SIZE,
            vector_dimension: 0,
            group_definitions: Vec::new(),
            header: HeaderMode::Auto,
        }
    }
}

impl SessionConfig {
    /// Set the model file path
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    /// Set the model file encoding label
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Set the known vocabulary size (-1 = unknown)
    pub fn with_vocabulary_size(mut self, size: i64) -> Self {
        self.vocabulary_size = size;
        self
    }

    /// Set the vector dimension
    pub fn with_vector_dimension(mut self, dimension: i64) -> Self {
        self.vector_dimension = dimension;
        self
    }

    /// Replace the group definitions
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_definitions = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Set header handling
    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }

    /// Check every field and produce the typed options the loader needs.
    ///
    /// Group definitions are only checked for being non-blank here; parsing
    /// them is [`WordGroupIndex`](crate::WordGroupIndex)'s job.
    pub fn validate(&self) -> Result<LoadOptions, ConfigError> {
        if self.file_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingModelPath);
        }

        if !self.group_definitions.iter().any(|d| !d.trim().is_empty()) {
            return Err(ConfigError::NoWordGroups);
        }

        let dimension = usize::try_from(self.vector_dimension)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(ConfigError::InvalidDimension(self.vector_dimension))?;

        let vocabulary = match self.vocabulary_size {
            UNKNOWN_VOCABULARY_SIZE => VocabularySize::Unknown,
            n => usize::try_from(n)
                .ok()
                .filter(|&n| n > 0)
                .map(VocabularySize::Known)
                .ok_or(ConfigError::InvalidVocabularySize(n))?,
        };

        let encoding = Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))?;

        Ok(LoadOptions {
            path: self.file_path.clone(),
            encoding,
            vocabulary,
            dimension,
            header: self.header,
        })
    }

    /// Import settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| settings_error(path, e))?;
        serde_json::from_str(&text).map_err(|e| settings_error(path, e))
    }

    /// Export settings to a JSON file
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| settings_error(path, e))?;
        fs::write(path, text).map_err(|e| settings_error(path, e))
    }
}

fn settings_error(path: &Path, err: impl fmt::Display) -> ConfigError {
    ConfigError::SettingsFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Whether the number of model rows is known before reading the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularySize {
    Known(usize),
    Unknown,
}

/// Validated loader settings
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
    pub vocabulary: VocabularySize,
    pub dimension: NonZeroUsize,
    pub header: HeaderMode,
}

impl LoadOptions {
    /// Vector width as a plain integer
    pub fn dim(&self) -> usize {
        self.dimension.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid() -> SessionConfig {
        SessionConfig::default()
            .with_file_path("vectors.txt")
            .with_vector_dimension(2)
            .with_groups(["king, queen"])
    }

    #[test]
    fn test_valid_config() {
        let opts = valid().validate().unwrap();
        assert_eq!(opts.dim(), 2);
        assert_eq!(opts.vocabulary, VocabularySize::Unknown);
        assert_eq!(opts.encoding, encoding_rs::UTF_8);
        assert_eq!(opts.header, HeaderMode::Auto);
    }

    #[test]
    fn test_known_vocabulary() {
        let opts = valid().with_vocabulary_size(3).validate().unwrap();
        assert_eq!(opts.vocabulary, VocabularySize::Known(3));
    }

    #[test]
    fn test_missing_path() {
        let cfg = valid().with_file_path("");
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::MissingModelPath);
    }

    #[test]
    fn test_blank_groups_rejected() {
        let cfg = valid().with_groups(["", "   "]);
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::NoWordGroups);
    }

    #[test]
    fn test_bad_dimension() {
        let cfg = valid().with_vector_dimension(0);
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::InvalidDimension(0));
        let cfg = valid().with_vector_dimension(-5);
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::InvalidDimension(-5));
    }

    #[test]
    fn test_bad_vocabulary_size() {
        let cfg = valid().with_vocabulary_size(-2);
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidVocabularySize(-2)
        );
        let cfg = valid().with_vocabulary_size(0);
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidVocabularySize(0)
        );
    }

    #[test]
    fn test_encoding_labels() {
        let opts = valid().with_encoding("latin1").validate().unwrap();
        assert_eq!(opts.encoding, encoding_rs::WINDOWS_1252);

        let cfg = valid().with_encoding("klingon");
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::UnknownEncoding("klingon".into())
        );
    }

    #[test]
    fn test_header_mode_parse() {
        assert_eq!("Present".parse::<HeaderMode>().unwrap(), HeaderMode::Present);
        assert!("sometimes".parse::<HeaderMode>().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let cfg = valid().with_header(HeaderMode::Absent);
        cfg.to_json_file(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"vocabularySize\": -1"));
        assert!(text.contains("\"groupDefinitions\""));

        let loaded = SessionConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_json_defaults() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{ "filePath": "m.txt", "vectorDimension": 50, "groupDefinitions": ["a,b"] }"#,
        )
        .unwrap();
        assert_eq!(cfg.encoding, "utf-8");
        assert_eq!(cfg.vocabulary_size, -1);
        assert!(cfg.validate().is_ok());
    }
}
