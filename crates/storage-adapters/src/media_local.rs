//! Filesystem blob store. Content-addressed: files land under
//! `<root>/<folder>/<aa>/<bb>/<digest>.<ext>` where the digest is the
//! sha256 of the bytes, so re-uploading identical content is a no-op and
//! URLs never collide.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use domains::{BlobStore, DomainError, Result};

pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let mut url_prefix = url_prefix.into();
        while url_prefix.ends_with('/') {
            url_prefix.pop();
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    fn relative_path(digest: &str, folder: &str, ext: &str) -> String {
        format!("{folder}/{}/{}/{digest}.{ext}", &digest[..2], &digest[2..4])
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

fn io_err(e: std::io::Error) -> DomainError {
    DomainError::Internal(format!("blob store i/o: {e}"))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, data: Bytes, content_type: &str, folder_hint: &str) -> Result<String> {
        let digest = hex::encode(Sha256::digest(&data));
        let ext = extension_for(content_type);
        let rel = Self::relative_path(&digest, folder_hint, ext);

        let path = self.root.join(&rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, &data).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), "stored blob");
        Ok(format!("{}/{rel}", self.url_prefix))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let rel = url
            .strip_prefix(&self.url_prefix)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| DomainError::BadRequest("url outside blob store".into()))?;

        // Reject anything that could step outside the root.
        if Path::new(rel)
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(DomainError::BadRequest("url outside blob store".into()));
        }

        match tokio::fs::remove_file(self.root.join(rel)).await {
            Ok(()) => Ok(()),
            // Already gone is fine; deletes are idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(e)),
        }
    }
}
