use crate::error::LuftdatenError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "luftdaten_rs";
pub const LUFTDATEN_DIR_NAME: &str = "luftdaten";
pub const RAW_DIR_NAME: &str = "raw";
pub const AGGREGATED_DIR_NAME: &str = "aggregated";

pub fn get_data_dir() -> Result<PathBuf, LuftdatenError> {
    dirs::data_dir()
        .ok_or(LuftdatenError::DataDirResolution)
        .map(|p| p.join(DATA_DIR_NAME))
}

/// `<data_dir>/luftdaten/raw`, the local mirror of the archive.
pub fn raw_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LUFTDATEN_DIR_NAME).join(RAW_DIR_NAME)
}

/// `<data_dir>/luftdaten/aggregated`, rebuilt on every processing run.
pub fn aggregated_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LUFTDATEN_DIR_NAME).join(AGGREGATED_DIR_NAME)
}

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let data_dir = Path::new("/data");
        assert_eq!(raw_dir(data_dir), Path::new("/data/luftdaten/raw"));
        assert_eq!(
            aggregated_dir(data_dir),
            Path::new("/data/luftdaten/aggregated")
        );
    }

    #[tokio::test]
    async fn test_ensure_dir_exists() -> io::Result<()> {
        let tmp = TempDir::new()?;
        let nested = tmp.path().join("a").join("b");

        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        // Existing directories are fine.
        ensure_dir_exists(&nested).await?;

        let file = tmp.path().join("file");
        std::fs::write(&file, "x")?;
        assert!(ensure_dir_exists(&file).await.is_err());
        Ok(())
    }
}
