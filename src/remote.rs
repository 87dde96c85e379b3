//! WebDAV collaborator: photo listing plus the quarantine/restore moves.
//!
//! Quarantining never deletes anything remotely. A delete moves the file
//! into a per-session subdirectory of the quarantine directory, and restore
//! moves it back to its original path.

use chrono::Utc;
use triage_session::{PhotoEntry, QuarantineRecord, RemoteError, RemoteMutations};

const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tif", "tiff",
];

/// Configuration for the WebDAV photo remote
#[derive(Debug, Clone)]
pub struct DavConfig {
    pub server_url: String,
    pub username: String,
    pub app_password: String,
    pub quarantine_dir: String,
}

/// WebDAV client for listing photos and moving them in and out of
/// quarantine
pub struct DavRemote {
    config: DavConfig,
}

impl DavRemote {
    pub fn new(config: DavConfig) -> Self {
        Self { config }
    }

    /// Create a WebDAV client
    fn create_client(&self) -> Result<reqwest_dav::Client, RemoteError> {
        let webdav_url = format!(
            "{}/remote.php/dav/files/{}",
            self.config.server_url.trim_end_matches('/'),
            self.config.username
        );

        reqwest_dav::ClientBuilder::new()
            .set_host(webdav_url)
            .set_auth(reqwest_dav::Auth::Basic(
                self.config.username.clone(),
                self.config.app_password.clone(),
            ))
            .build()
            .map_err(|e| RemoteError::Other(format!("WebDAV client error: {:?}", e)))
    }

    /// Lists the photo files directly inside `folder`, flattened into
    /// entries keyed by their lower-cased remote path.
    pub async fn list_photos(&self, folder: &str) -> Result<Vec<PhotoEntry>, RemoteError> {
        let client = self.create_client()?;

        let list = client
            .list(folder, reqwest_dav::Depth::Number(1))
            .await
            .map_err(|e| RemoteError::Network(format!("list failed: {:?}", e)))?;

        let base = folder.trim_end_matches('/');
        let mut entries = Vec::new();
        for item in list {
            if let reqwest_dav::list_cmd::ListEntity::File(file) = item {
                let Some(name) = file.href.split('/').next_back() else {
                    continue;
                };
                if !is_photo_filename(name) {
                    continue;
                }
                let path = format!("{}/{}", base, name);
                entries.push(PhotoEntry {
                    key: path.to_lowercase(),
                    path,
                    size: file.content_length.max(0) as u64,
                    modified: Some(file.last_modified.to_rfc3339()),
                    downloadable: true,
                });
            }
        }

        log::info!("listed {} photos in {}", entries.len(), folder);
        Ok(entries)
    }

    /// Ensure a directory exists on the remote server
    async fn ensure_directory(
        &self,
        client: &reqwest_dav::Client,
        path: &str,
    ) -> Result<(), RemoteError> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut current_path = String::new();

        for part in parts {
            if current_path.is_empty() {
                current_path = part.to_string();
            } else {
                current_path = format!("{}/{}", current_path, part);
            }

            // MKCOL fails if the directory already exists
            if let Err(e) = client.mkcol(&current_path).await {
                log::debug!("MKCOL '{}' note: {:?}", current_path, e);
            }
        }

        Ok(())
    }
}

/// Case-insensitive photo extension check
fn is_photo_filename(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            PHOTO_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Quarantine destination: `<dir>/<session_id>/<filename>`
fn quarantine_target(quarantine_dir: &str, session_id: &str, path: &str) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    format!(
        "{}/{}/{}",
        quarantine_dir.trim_end_matches('/'),
        session_id,
        filename
    )
}

impl RemoteMutations for DavRemote {
    async fn quarantine(
        &self,
        path: &str,
        session_id: &str,
    ) -> Result<QuarantineRecord, RemoteError> {
        let client = self.create_client()?;

        let session_dir = format!(
            "{}/{}",
            self.config.quarantine_dir.trim_end_matches('/'),
            session_id
        );
        self.ensure_directory(&client, &session_dir).await?;

        let trashed = quarantine_target(&self.config.quarantine_dir, session_id, path);
        client
            .mv(path, &trashed)
            .await
            .map_err(|e| RemoteError::Network(format!("quarantine move failed: {:?}", e)))?;

        log::info!("quarantined {} -> {}", path, trashed);
        Ok(QuarantineRecord {
            original_path: path.to_string(),
            trashed_path: trashed,
            session_id: session_id.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    async fn restore(&self, trashed_path: &str, original_path: &str) -> Result<(), RemoteError> {
        let client = self.create_client()?;

        client
            .mv(trashed_path, original_path)
            .await
            .map_err(|e| RemoteError::Network(format!("restore move failed: {:?}", e)))?;

        log::info!("restored {} -> {}", trashed_path, original_path);
        Ok(())
    }
}
