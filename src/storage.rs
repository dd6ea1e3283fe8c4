use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
use thiserror::Error;

use crate::{config::StorageConfig, upload::UploadedFile, utils::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// File written under `<root>/<bucket>/`, document keeps the file name.
    Disk,
    /// Document keeps the base64-encoded bytes.
    Inline,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disk" => Ok(Backend::Disk),
            "inline" => Ok(Backend::Inline),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// One upload bucket.
#[derive(Debug, Clone)]
pub struct FileStore {
    backend: Backend,
    bucket: &'static str,
    dir: PathBuf,
}

impl FileStore {
    pub fn new(backend: Backend, root: &Path, bucket: &'static str) -> Self {
        FileStore {
            backend,
            bucket,
            dir: root.join(bucket),
        }
    }

    pub fn bucket(&self) -> &'static str {
        self.bucket
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn init(&self) -> io::Result<()> {
        if self.backend == Backend::Disk {
            tokio::fs::create_dir_all(&self.dir).await?;
        }
        Ok(())
    }

    /// Persists the file and returns what the document should hold.
    pub async fn put(&self, file: &UploadedFile) -> Result<String, StorageError> {
        match self.backend {
            Backend::Inline => Ok(STANDARD.encode(&file.bytes)),
            Backend::Disk => {
                let name = unique_file_name(&file.extension());
                let path = self.dir.join(&name);
                tokio::fs::write(&path, &file.bytes)
                    .await
                    .map_err(|source| StorageError::Write { path, source })?;
                tracing::debug!(bucket = self.bucket, file = %name, bytes = file.bytes.len(), "stored upload");
                Ok(name)
            }
        }
    }

    /// Like [`FileStore::put`], but disk references carry the bucket prefix
    /// (`payments/123-456.png`) so they resolve against the static mount.
    pub async fn put_qualified(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let reference = self.put(file).await?;
        Ok(match self.backend {
            Backend::Disk => format!("{}/{}", self.bucket, reference),
            Backend::Inline => reference,
        })
    }

    /// Whether `reference` names a file that exists in this bucket.
    pub async fn holds(&self, reference: &str) -> bool {
        match self.resolve(reference) {
            Some(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }

    pub async fn remove(&self, reference: &str) -> Result<(), StorageError> {
        let Some(path) = self.resolve(reference) else {
            return Ok(());
        };
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| StorageError::Remove { path, source })
    }

    /// Removal whose failure must not fail the request.
    pub async fn discard(&self, reference: &str) {
        if let Err(err) = self.remove(reference).await {
            tracing::warn!(bucket = self.bucket, error = %err, "error deleting file");
        }
    }

    pub async fn discard_all(&self, references: &[String]) {
        for reference in references {
            self.discard(reference).await;
        }
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        if self.backend == Backend::Inline || reference.is_empty() {
            return None;
        }
        let name = reference
            .strip_prefix(self.bucket)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(reference);
        // only the last component, so a stored value can't point outside the bucket
        Path::new(name).file_name().map(|file| self.dir.join(file))
    }
}

/// `<millis>-<random below 1e9><ext>`
pub fn unique_file_name(extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{millis}-{suffix}{extension}")
}

/// All upload buckets the routers write to.
#[derive(Debug, Clone)]
pub struct FileStores {
    /// Product images, course images and videos.
    pub media: FileStore,
    /// Order payment screenshots.
    pub order_proofs: FileStore,
    /// Payment screenshots for course purchases.
    pub payment_proofs: FileStore,
    pub qrcodes: FileStore,
}

impl FileStores {
    pub fn new(cfg: &StorageConfig) -> Self {
        FileStores {
            media: FileStore::new(cfg.media, &cfg.root, "uploads"),
            order_proofs: FileStore::new(cfg.order_proofs, &cfg.root, "payments"),
            payment_proofs: FileStore::new(cfg.payment_proofs, &cfg.root, "payment-proofs"),
            qrcodes: FileStore::new(cfg.qrcodes, &cfg.root, "qrcode"),
        }
    }

    /// Creates the disk bucket directories. Runs once during bootstrap.
    pub async fn init(&self) -> io::Result<()> {
        for store in self.all() {
            store.init().await?;
        }
        Ok(())
    }

    /// Disk buckets that get a static mount under `/<bucket>`.
    pub fn disk_buckets(&self) -> impl Iterator<Item = &FileStore> {
        self.all().into_iter().filter(|s| s.backend == Backend::Disk)
    }

    fn all(&self) -> [&FileStore; 4] {
        [&self.media, &self.order_proofs, &self.payment_proofs, &self.qrcodes]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> UploadedFile {
        UploadedFile {
            file_name: "proof.png".to_owned(),
            content_type: Some("image/png".to_owned()),
            bytes: b"not really a png".to_vec(),
        }
    }

    #[test]
    fn file_names_follow_timestamp_random_extension() {
        let name = unique_file_name(".mp4");
        let stem = name.strip_suffix(".mp4").unwrap();
        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<u128>().unwrap() > 1_600_000_000_000);
        assert!(suffix.parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Disk".parse::<Backend>().unwrap(), Backend::Disk);
        assert_eq!("inline".parse::<Backend>().unwrap(), Backend::Inline);
        assert!("s3".parse::<Backend>().is_err());
    }

    #[tokio::test]
    async fn disk_put_then_remove() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(Backend::Disk, root.path(), "uploads");
        store.init().await.unwrap();

        let name = store.put(&png()).await.unwrap();
        assert!(name.ends_with(".png"));
        let written = tokio::fs::read(store.dir().join(&name)).await.unwrap();
        assert_eq!(written, png().bytes);

        store.remove(&name).await.unwrap();
        assert!(!store.dir().join(&name).exists());
    }

    #[tokio::test]
    async fn qualified_reference_resolves_back_to_the_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(Backend::Disk, root.path(), "payments");
        store.init().await.unwrap();

        let reference = store.put_qualified(&png()).await.unwrap();
        assert!(reference.starts_with("payments/"));

        store.remove(&reference).await.unwrap();
        let left = std::fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn inline_put_is_base64_and_remove_is_noop() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(Backend::Inline, root.path(), "payment-proofs");
        store.init().await.unwrap();
        assert!(!store.dir().exists());

        let encoded = store.put(&png()).await.unwrap();
        assert_eq!(STANDARD.decode(&encoded).unwrap(), png().bytes);
        store.remove(&encoded).await.unwrap();
    }

    #[tokio::test]
    async fn removing_missing_file_errors_but_discard_swallows() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(Backend::Disk, root.path(), "uploads");
        store.init().await.unwrap();

        assert!(store.remove("gone.png").await.is_err());
        store.discard("gone.png").await;
    }

    #[tokio::test]
    async fn holds_matches_bare_and_qualified_references() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(Backend::Disk, root.path(), "uploads");
        store.init().await.unwrap();

        let reference = store.put_qualified(&png()).await.unwrap();
        let bare = reference.strip_prefix("uploads/").unwrap();
        assert!(store.holds(&reference).await);
        assert!(store.holds(bare).await);
        assert!(!store.holds("intro.png").await);
        assert!(!store.holds("").await);

        let inline = FileStore::new(Backend::Inline, root.path(), "uploads");
        assert!(!inline.holds(&reference).await);
    }

    #[test]
    fn references_cannot_escape_the_bucket() {
        let store = FileStore::new(Backend::Disk, Path::new("/srv"), "uploads");
        assert_eq!(
            store.resolve("../../etc/passwd"),
            Some(PathBuf::from("/srv/uploads/passwd"))
        );
    }
}
