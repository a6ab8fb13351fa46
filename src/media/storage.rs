use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Local file system storage rooted at `MEDIA_ROOT`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MediaStorage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a relative storage path.
    /// Anything other than plain path segments is refused.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if !plain || relative.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing storage path {:?}", relative),
            ));
        }

        Ok(self.root.join(relative))
    }

    /// Write `data` at `relative`, creating parent directories as needed.
    pub async fn save(&self, relative: &str, data: &[u8]) -> io::Result<()> {
        let target = self.resolve(relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, data).await?;

        info!("Stored {} bytes at {}", data.len(), target.display());
        Ok(())
    }

    pub async fn read(&self, relative: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(relative)?).await
    }

    /// Remove a stored file and its per-image directory if it is left empty.
    /// A missing file is not an error.
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        let target = self.resolve(relative)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Stored file {} already missing", target.display());
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if let Some(parent) = target.parent() {
            // Only succeeds when empty
            let _ = tokio::fs::remove_dir(parent).await;
        }

        info!("Removed stored file {}", target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn temp_storage() -> MediaStorage {
        MediaStorage::new(std::env::temp_dir().join(format!("media-test-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_save_read_remove() {
        let storage = temp_storage();
        let path = "post_images/17/17.png";

        assert_ok!(storage.save(path, b"jpeg bytes").await);
        assert_eq!(storage.read(path).await.expect("file exists"), b"jpeg bytes");

        assert_ok!(storage.remove(path).await);
        assert_err!(storage.read(path).await);
        assert!(!storage.root().join("post_images/17").exists());

        let _ = tokio::fs::remove_dir_all(storage.root()).await;
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_ok() {
        let storage = temp_storage();
        assert_ok!(storage.remove("post_images/1/1.jpg").await);
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let storage = MediaStorage::new("/srv/media");

        assert_err!(storage.resolve("../secrets"));
        assert_err!(storage.resolve("/etc/passwd"));
        assert_err!(storage.resolve("./post_images/1.jpg"));
        assert_err!(storage.resolve(""));
        assert_eq!(
            storage.resolve("post_images/5/5.jpg").expect("plain path"),
            PathBuf::from("/srv/media/post_images/5/5.jpg")
        );
    }
}
