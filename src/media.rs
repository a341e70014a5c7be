use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory of the media root holding profile pictures.
pub const PROFILE_PICTURES_DIR: &str = "profile_pictures";

/// Uploaded files on local disk. Stored names are relative to the root and use `/`.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory tree uploads are written into.
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(self.root.join(PROFILE_PICTURES_DIR)).await
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Write a profile picture under a fresh unique name and return that name.
    pub async fn store_profile_picture(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        bytes: &[u8],
    ) -> io::Result<String> {
        let extension = file_extension(original_name, content_type);
        let name = format!("{}/{}.{}", PROFILE_PICTURES_DIR, Uuid::new_v4(), extension);
        let path = self.path_of(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(name)
    }

    /// Delete a stored file. Returns `false` when it was already gone.
    pub async fn remove(&self, name: &str) -> io::Result<bool> {
        let path = self.path_of(name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Media file {} was already missing", path.display());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Picks the extension from the uploaded file name, falling back to the MIME subtype.
fn file_extension(original_name: Option<&str>, content_type: &str) -> String {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext;
    }
    match content_type.split_once('/').map(|(_, subtype)| subtype) {
        Some("jpeg") => "jpg".to_string(),
        Some("svg+xml") => "svg".to_string(),
        Some(subtype) if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) => {
            subtype.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}

/// Join a public base (`scheme://host`), the media URL prefix and a stored name.
pub fn absolute_url(base: &str, media_url: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = media_url.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", base, name)
    } else {
        format!("{}/{}/{}", base, prefix, name)
    }
}
