// file: src/models/file_handle.rs
// description: user-selected file staged for upload
// reference: selection and upload contract

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
enum FileContents {
    OnDisk(PathBuf),
    InMemory(Vec<u8>),
}

/// A candidate file. Validation happens in the selection controller, so a
/// handle may carry any name until it is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    name: String,
    size: u64,
    contents: FileContents,
}

impl FileHandle {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PipelineError::Validation(format!("cannot read {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(PipelineError::Validation(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PipelineError::Validation(format!("invalid file name: {}", path.display()))
            })?
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            contents: FileContents::OnDisk(path.to_path_buf()),
        })
    }

    pub fn in_memory(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            contents: FileContents::InMemory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Extension including the leading dot, e.g. `.csv`.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rfind('.')
            .filter(|&idx| idx > 0)
            .map(|idx| &self.name[idx..])
    }

    /// Name without the `.csv` marker, as shown in notifications.
    pub fn display_stem(&self) -> &str {
        self.name.strip_suffix(".csv").unwrap_or(&self.name)
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.contents {
            FileContents::OnDisk(path) => Ok(tokio::fs::read(path).await?),
            FileContents::InMemory(bytes) => Ok(bytes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extension_and_stem() {
        let handle = FileHandle::in_memory("sales.2024.csv", b"a,b\n1,2\n".to_vec());
        assert_eq!(handle.extension(), Some(".csv"));
        assert_eq!(handle.display_stem(), "sales.2024");
        assert_eq!(handle.size(), 8);

        let bare = FileHandle::in_memory("README", vec![]);
        assert_eq!(bare.extension(), None);
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata_and_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("people.csv");
        fs::write(&path, "name,age\nana,31\n").unwrap();

        let handle = FileHandle::from_path(&path).unwrap();
        assert_eq!(handle.name(), "people.csv");
        assert_eq!(handle.size(), 16);
        assert_eq!(handle.read_bytes().await.unwrap(), b"name,age\nana,31\n");
    }

    #[test]
    fn test_from_path_rejects_directory() {
        let temp = TempDir::new().unwrap();
        assert!(FileHandle::from_path(temp.path()).is_err());
    }
}
