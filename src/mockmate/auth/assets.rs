//! Asset staging for the sign-up form. Selected files are read into memory with
//! a preview encoding and held per kind until submission moves them into the
//! upload call. Nothing here touches the network.

use crate::mockmate::auth::validator::{FieldError, FormField};
use base64ct::{Base64, Encoding};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, instrument};

/// The only document type accepted for resumes.
pub const RESUME_MIME: &str = "application/pdf";
/// Fallback when neither the extension nor the content identifies the file.
pub const UNKNOWN_MIME: &str = "application/octet-stream";
/// Default per-file ceiling for staged assets.
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Profile,
    Resume,
}

impl AssetKind {
    /// Path segment used in `users/{account}/{kind}/{file}`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Resume => "resume",
        }
    }

    #[must_use]
    pub const fn field(self) -> FormField {
        match self {
            Self::Profile => FormField::ProfileImage,
            Self::Resume => FormField::Resume,
        }
    }

    fn accepts(self, mime: &str) -> bool {
        match self {
            Self::Profile => mime.starts_with("image/"),
            Self::Resume => mime == RESUME_MIME,
        }
    }

    const fn rejection(self) -> &'static str {
        match self {
            Self::Profile => "Please upload an image file",
            Self::Resume => "Please upload a PDF file",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local file picked by the user, not yet read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    file_name: String,
    declared_mime: Option<String>,
}

impl SelectedFile {
    /// Declares the type from the file extension, the way a file input does.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        let declared_mime = mime_from_extension(&path).map(str::to_string);

        Self {
            path,
            file_name,
            declared_mime,
        }
    }

    #[must_use]
    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "pdf" => Some(RESUME_MIME),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        "txt" => Some("text/plain"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// In-memory file with its declared type and a `data:` URL preview.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryAsset {
    file_name: String,
    bytes: Vec<u8>,
    declared_mime: String,
    preview: String,
}

impl fmt::Debug for BinaryAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryAsset")
            .field("file_name", &self.file_name)
            .field("declared_mime", &self.declared_mime)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl BinaryAsset {
    /// Builds an asset from bytes already in memory.
    pub fn from_bytes(
        file_name: impl Into<String>,
        declared_mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let declared_mime = declared_mime.into();
        let preview = format!(
            "data:{declared_mime};base64,{}",
            Base64::encode_string(&bytes)
        );

        Self {
            file_name: file_name.into(),
            bytes,
            declared_mime,
            preview,
        }
    }

    /// Reads a selected file for `kind`, rejecting it before any read when the
    /// declared type or size does not fit.
    ///
    /// # Errors
    /// `StageError::Rejected` for type or size violations, `StageError::Read`
    /// when the file cannot be read.
    #[instrument(skip(file), fields(file = %file.file_name, kind = %kind))]
    pub async fn load(file: SelectedFile, kind: AssetKind, max_bytes: u64) -> Result<Self, StageError> {
        if let Some(mime) = file.declared_mime() {
            if !kind.accepts(mime) {
                return Err(StageError::Rejected(FieldError::new(
                    kind.field(),
                    kind.rejection(),
                )));
            }
        }

        let metadata = tokio::fs::metadata(&file.path)
            .await
            .map_err(|source| StageError::Read {
                path: file.path.clone(),
                source,
            })?;

        if metadata.len() > max_bytes {
            return Err(StageError::Rejected(FieldError::new(
                kind.field(),
                format!("File must be at most {} KiB", max_bytes / 1024),
            )));
        }

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| StageError::Read {
                path: file.path.clone(),
                source,
            })?;

        let declared_mime = match file.declared_mime {
            Some(mime) => mime,
            None => {
                let sniffed = infer::get(&bytes).map_or(UNKNOWN_MIME, |matched| matched.mime_type());
                if !kind.accepts(sniffed) {
                    return Err(StageError::Rejected(FieldError::new(
                        kind.field(),
                        kind.rejection(),
                    )));
                }
                sniffed.to_string()
            }
        };

        debug!("read {} bytes as {}", bytes.len(), declared_mime);

        Ok(Self::from_bytes(file.file_name, declared_mime, bytes))
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    /// `data:<mime>;base64,<payload>` suitable for an inline preview.
    #[must_use]
    pub fn preview_encoding(&self) -> &str {
        &self.preview
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}")]
    Rejected(FieldError),
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Assets held by a form, one slot per kind. Staging the same kind again
/// replaces the previous asset.
#[derive(Debug)]
pub struct StagedAssets {
    profile: Option<BinaryAsset>,
    resume: Option<BinaryAsset>,
    max_bytes: u64,
}

impl Default for StagedAssets {
    fn default() -> Self {
        Self {
            profile: None,
            resume: None,
            max_bytes: DEFAULT_MAX_ASSET_BYTES,
        }
    }
}

impl StagedAssets {
    #[must_use]
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            ..Self::default()
        }
    }

    /// Reads `file` and stores it under `kind`. On error the slot is untouched.
    ///
    /// # Errors
    /// Propagates `BinaryAsset::load` failures.
    pub async fn stage(&mut self, file: SelectedFile, kind: AssetKind) -> Result<&BinaryAsset, StageError> {
        let asset = BinaryAsset::load(file, kind, self.max_bytes).await?;
        Ok(&*self.slot_mut(kind).insert(asset))
    }

    #[must_use]
    pub const fn get(&self, kind: AssetKind) -> Option<&BinaryAsset> {
        match kind {
            AssetKind::Profile => self.profile.as_ref(),
            AssetKind::Resume => self.resume.as_ref(),
        }
    }

    /// Drops the staged asset for `kind`, returning it.
    pub fn clear(&mut self, kind: AssetKind) -> Option<BinaryAsset> {
        self.slot_mut(kind).take()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.profile.is_none() && self.resume.is_none()
    }

    /// Moves the staged assets out in upload order: profile, then resume.
    pub(crate) fn into_uploads(self) -> Vec<(AssetKind, BinaryAsset)> {
        [
            (AssetKind::Profile, self.profile),
            (AssetKind::Resume, self.resume),
        ]
        .into_iter()
        .filter_map(|(kind, asset)| asset.map(|asset| (kind, asset)))
        .collect()
    }

    fn slot_mut(&mut self, kind: AssetKind) -> &mut Option<BinaryAsset> {
        match kind {
            AssetKind::Profile => &mut self.profile,
            AssetKind::Resume => &mut self.resume,
        }
    }
}
