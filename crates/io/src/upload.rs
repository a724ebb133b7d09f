// Pre-parse checks on a submitted file

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::IoError;

/// Bytes inspected for binary content.
const SNIFF_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// Checks run in order: presence, emptiness, size, extension, content.
pub fn validate_upload(path: &Path, max_size: u64) -> Result<UploadInfo, IoError> {
    let meta = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => {
            return Err(IoError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IoError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(IoError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let size = meta.len();
    if size == 0 {
        return Err(IoError::Empty {
            path: path.to_path_buf(),
        });
    }
    if size > max_size {
        return Err(IoError::TooLarge { size, max: max_size });
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext != "csv" {
        return Err(IoError::InvalidExtension { found: ext });
    }

    if looks_binary(path)? {
        return Err(IoError::InvalidContent {
            path: path.to_path_buf(),
        });
    }

    log::debug!("upload {} accepted ({size} bytes)", path.display());
    Ok(UploadInfo {
        path: path.to_path_buf(),
        size,
    })
}

fn looks_binary(path: &Path) -> Result<bool, IoError> {
    let read_err = |source: std::io::Error| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(read_err)?;
    Ok(head.contains(&0))
}
