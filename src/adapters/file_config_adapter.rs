//! INI file configuration adapter.

use crate::domain::error::ReinvestorError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReinvestorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReinvestorError::NotFound {
                path: path.display().to_string(),
            });
        }
        let mut config = Ini::new_cs();
        config
            .load(path)
            .map_err(|reason| ReinvestorError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ReinvestorError> {
        let mut config = Ini::new_cs();
        config
            .read(content.to_string())
            .map_err(|reason| ReinvestorError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}
