use async_std::fs::{self, File};
use async_std::io::prelude::*;
use async_std::io::{BufReader, stdin};
use async_std::path::PathBuf as AsyncPathBuf;
use std::io::{Error, ErrorKind, Result};
use std::path::Path;

/// Reads a whole file, or stdin for "-"
pub async fn read_input(path: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if path == "-" {
        BufReader::new(stdin()).read_to_end(&mut bytes).await?;
    } else {
        let metadata = fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{path} is not a file"),
            ));
        }
        BufReader::new(File::open(path).await?)
            .read_to_end(&mut bytes)
            .await?;
    }
    Ok(bytes)
}

/// Writes bytes to a file, creating its directory first
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let path = AsyncPathBuf::from(path.to_path_buf());
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).await?;
        }
    }
    fs::write(&path, bytes).await
}
