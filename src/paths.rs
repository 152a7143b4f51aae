use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR: &str = "studytrack";

pub fn data_dir() -> Result<PathBuf> {
    data_dir_from_env(env::var_os("STUDYTRACK_DATA_DIR"))
}

pub(crate) fn data_dir_from_env(env_value: Option<OsString>) -> Result<PathBuf> {
    match env_value {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => {
            let base = dirs::data_dir().context("unable to resolve data directory")?;
            Ok(base.join(APP_DIR))
        }
    }
}

pub fn database_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("studytrack.db"))
}

pub fn log_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("studytrack.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_prefers_non_empty_override() {
        let dir = data_dir_from_env(Some(OsString::from("/tmp/studytrack-test")))
            .expect("override should resolve");
        assert_eq!(dir, PathBuf::from("/tmp/studytrack-test"));
    }

    #[test]
    fn data_dir_ignores_empty_override() {
        if let Ok(dir) = data_dir_from_env(Some(OsString::new())) {
            assert!(dir.ends_with(APP_DIR));
        }
    }
}
