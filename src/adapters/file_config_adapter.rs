//! INI file configuration adapter.

use crate::domain::error::SeasontraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::{Path, PathBuf};

pub struct FileConfigAdapter {
    config: Ini,
    base_dir: Option<PathBuf>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SeasontraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| SeasontraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self {
            config,
            base_dir: path.parent().map(Path::to_path_buf),
        })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self {
            config,
            base_dir: None,
        })
    }

    /// Directory of the loaded file; relative data paths resolve against it.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn has_value(&self, section: &str, key: &str) -> bool {
        self.config
            .get(section, key)
            .is_some_and(|v| !v.trim().is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_optional_int(&self, section: &str, key: &str) -> Option<Result<i64, String>> {
        if !self.has_value(section, key) {
            return None;
        }
        self.config.getint(section, key).transpose()
    }

    fn get_optional_double(&self, section: &str, key: &str) -> Option<Result<f64, String>> {
        if !self.has_value(section, key) {
            return None;
        }
        self.config.getfloat(section, key).transpose()
    }
}
