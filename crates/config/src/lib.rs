//! Configuration loading and validation.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults,
//! 2. an optional config file (TOML, YAML or JSON, picked by extension),
//! 3. `DARKROOM_*` environment variables (e.g. `DARKROOM_THUMBNAIL_HEIGHT=320`).

pub mod error;

use crate::error::{ErrorKind, Result};
pub use darkroom_render::Encoding;
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "DARKROOM_";
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 200;
const DATABASE_FILENAME: &str = "library.sqlite";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite database holding records and media.
    pub database: PathBuf,
    /// Open the store read-only: existing records are never modified.
    pub read_only: bool,
    /// Bounding height, in pixels, of generated thumbnails.
    pub thumbnail_height: u32,
    /// Output format of rendered (edited and thumbnail) images.
    pub encoding: Encoding,
}
impl Default for Config {
    fn default() -> Self {
        let database = ProjectDirs::from("", "", "darkroom")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME));
        Self {
            database,
            read_only: false,
            thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
            encoding: Encoding::default(),
        }
    }
}

impl Config {
    /// Load the configuration from defaults, an optional file, and the
    /// environment, then validate it.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(file)?.merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    /// Defaults merged with an optional config file (no environment).
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let Some(path) = file else {
            return Ok(figment);
        };
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "Loading configuration file");
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    /// Extract and validate a configuration from any figment.
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| exn::Exn::from(ErrorKind::Parse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_height == 0 {
            exn::bail!(ErrorKind::Invalid("thumbnail_height"));
        }
        if self.database.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn config_file(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(&format!(".{extension}")).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::extract(Config::figment(None).unwrap()).unwrap();
        assert_eq!(config.thumbnail_height, DEFAULT_THUMBNAIL_HEIGHT);
        assert_eq!(config.encoding, Encoding::Png);
        assert!(!config.read_only);
        assert!(config.database.ends_with(DATABASE_FILENAME));
    }

    #[rstest]
    #[case("toml", "database = \"/tmp/a.sqlite\"\nthumbnail_height = 320\nencoding = \"jpeg\"\n")]
    #[case("yaml", "database: /tmp/a.sqlite\nthumbnail_height: 320\nencoding: jpeg\n")]
    #[case("yml", "database: /tmp/a.sqlite\nthumbnail_height: 320\nencoding: jpeg\n")]
    #[case("json", r#"{"database": "/tmp/a.sqlite", "thumbnail_height": 320, "encoding": "jpeg"}"#)]
    fn test_file_overrides_defaults(#[case] extension: &str, #[case] contents: &str) {
        let file = config_file(extension, contents);
        let config = Config::extract(Config::figment(Some(file.path())).unwrap()).unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/a.sqlite"));
        assert_eq!(config.thumbnail_height, 320);
        assert_eq!(config.encoding, Encoding::Jpeg);
        // Not in the file, so still the default.
        assert!(!config.read_only);
    }

    #[test]
    fn test_unsupported_format() {
        let file = config_file("ini", "thumbnail_height=320");
        let err = Config::figment(Some(file.path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::figment(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[rstest]
    #[case("thumbnail_height = 0\n", "thumbnail_height")]
    #[case("database = \"\"\n", "database")]
    fn test_invalid_values(#[case] contents: &str, #[case] field: &str) {
        let file = config_file("toml", contents);
        let err = Config::extract(Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(f) if *f == field));
    }

    #[test]
    fn test_wrong_type_fails_to_parse() {
        let file = config_file("toml", "thumbnail_height = \"tall\"\n");
        let err = Config::extract(Config::figment(Some(file.path())).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse(_)));
    }
}
