//! File-upload declarations and uploaded file descriptors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory name used under the system temp dir when no destination is configured.
pub const DEFAULT_UPLOAD_DIR: &str = "archrest-file-uploads";

/// One accepted multipart file field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadSpec {
    /// Form field name.
    pub name: String,
    /// Maximum number of files for this field; one when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

impl FileUploadSpec {
    /// A single-file field.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_count: None,
        }
    }

    /// Sets the maximum number of files.
    #[must_use]
    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Effective file limit for the field.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.max_count.unwrap_or(1)
    }

    /// Returns `true` when the field accepts more than one file.
    #[must_use]
    pub fn is_multiple(&self) -> bool {
        self.limit() > 1
    }
}

/// The accepted shapes of an upload declaration.
///
/// Every shape normalizes to a list of [`FileUploadSpec`] entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFields {
    /// A bare field name.
    Name(String),
    /// Several bare field names.
    Names(Vec<String>),
    /// One structured entry.
    Spec(FileUploadSpec),
    /// Several structured entries.
    Specs(Vec<FileUploadSpec>),
}

impl UploadFields {
    /// Normalizes the declaration into structured entries, preserving order.
    #[must_use]
    pub fn normalize(self) -> Vec<FileUploadSpec> {
        match self {
            Self::Name(name) => vec![FileUploadSpec::new(name)],
            Self::Names(names) => names.into_iter().map(FileUploadSpec::new).collect(),
            Self::Spec(spec) => vec![spec],
            Self::Specs(specs) => specs,
        }
    }
}

impl From<&str> for UploadFields {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for UploadFields {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<&str>> for UploadFields {
    fn from(names: Vec<&str>) -> Self {
        Self::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for UploadFields {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<FileUploadSpec> for UploadFields {
    fn from(spec: FileUploadSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<Vec<FileUploadSpec>> for UploadFields {
    fn from(specs: Vec<FileUploadSpec>) -> Self {
        Self::Specs(specs)
    }
}

/// Server-wide upload settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileUploadOptions {
    /// Destination directory; `<tmp>/archrest-file-uploads` when unset.
    pub dest: Option<PathBuf>,
    /// Maximum size of a single file in bytes.
    pub max_file_size: Option<u64>,
    /// Maximum number of files per request.
    pub max_files: Option<usize>,
    /// Maximum number of non-file fields per request.
    pub max_fields: Option<usize>,
}

impl FileUploadOptions {
    /// The directory uploaded files are written to.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.dest
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_UPLOAD_DIR))
    }
}

/// A file written to disk by the upload stage.
///
/// Serializes with the same keys the upload stage places into the request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub fieldname: String,
    /// Client-supplied file name.
    pub originalname: String,
    /// Client-supplied content type.
    pub mimetype: String,
    /// Directory the file was written to.
    pub destination: PathBuf,
    /// Generated file name inside `destination`.
    pub filename: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}
