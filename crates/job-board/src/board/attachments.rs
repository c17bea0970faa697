use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::domain::{Attachment, EntityKind};

const RESUMES_DIR: &str = "resumes";
const VACANCIES_DIR: &str = "vacancies";

/// How the transport classified an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Document,
    Photo,
}

/// File attached to an inbound message, not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingFile {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    pub kind: FileKind,
}

/// How a stored attachment should be re-sent through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Document,
}

impl MediaKind {
    /// JPEG and PNG go out as photos; everything else as a document.
    pub fn for_path(path: &Path) -> Self {
        match mime_guess::from_path(path).first() {
            Some(mime) if mime == mime::IMAGE_JPEG || mime == mime::IMAGE_PNG => MediaKind::Photo,
            _ => MediaKind::Document,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("failed to write attachment {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove attachment {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to prepare attachment directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Files on disk under `<root>/resumes/` and `<root>/vacancies/`.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn directory(&self, kind: EntityKind) -> PathBuf {
        match kind {
            EntityKind::Resume => self.root.join(RESUMES_DIR),
            EntityKind::Vacancy => self.root.join(VACANCIES_DIR),
        }
    }

    /// Create both role directories if they do not exist yet.
    pub async fn prepare(&self) -> Result<(), AttachmentError> {
        for kind in [EntityKind::Resume, EntityKind::Vacancy] {
            let path = self.directory(kind);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| AttachmentError::Prepare { path, source })?;
        }
        Ok(())
    }

    /// `<file_id>_<name>` for documents, `<file_id>.jpg` for photos.
    pub fn path_for(&self, kind: EntityKind, file: &IncomingFile) -> PathBuf {
        let file_id = sanitize(&file.file_id);
        let name = match (file.kind, file.file_name.as_deref()) {
            (FileKind::Document, Some(name)) if !sanitize(name).is_empty() => {
                format!("{file_id}_{}", sanitize(name))
            }
            (FileKind::Document, _) => format!("{file_id}.bin"),
            (FileKind::Photo, _) => format!("{file_id}.jpg"),
        };
        self.directory(kind).join(name)
    }

    pub async fn write(
        &self,
        kind: EntityKind,
        file: &IncomingFile,
        bytes: &[u8],
    ) -> Result<Attachment, AttachmentError> {
        let path = self.path_for(kind, file);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AttachmentError::Prepare {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| AttachmentError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Attachment {
            file_id: file.file_id.clone(),
            path,
        })
    }

    /// Returns `false` when the file was already gone.
    pub async fn remove(&self, attachment: &Attachment) -> Result<bool, AttachmentError> {
        match tokio::fs::remove_file(&attachment.path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AttachmentError::Remove {
                path: attachment.path.clone(),
                source,
            }),
        }
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
