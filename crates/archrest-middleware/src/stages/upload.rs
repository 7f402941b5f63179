//! Multipart file upload stage.
//!
//! Parses `multipart/form-data` bodies for routes that declare file fields.
//! Files are streamed to disk under fresh UUID names, recorded on the
//! [`RequestContext`], and described in the parsed body under their field
//! name. Plain form fields become body properties.
//!
//! When any part is rejected the request fails with `400` and every file
//! already written for it is deleted. Requests that are not multipart pass
//! through untouched.

use crate::middleware::{Middleware, Next};
use archrest_core::{
    BoxFuture, FileUploadOptions, FileUploadSpec, Request, RequestContext, Response, ResponseExt,
    UploadedFile,
};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Failure while handling an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A file arrived under an undeclared field, or past its field's count.
    #[error("Unexpected field")]
    UnexpectedField(String),

    /// More files than the server-wide limit.
    #[error("Too many files")]
    TooManyFiles,

    /// A file exceeded the configured size.
    #[error("File too large")]
    FileTooLarge,

    /// More plain fields than the server-wide limit.
    #[error("Too many fields")]
    TooManyFields,

    /// The multipart stream was malformed.
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    /// Writing a file failed.
    #[error("failed to store uploaded file: {0}")]
    Io(#[from] std::io::Error),

    /// A file descriptor could not be encoded.
    #[error("failed to describe uploaded file: {0}")]
    Encode(#[from] serde_json::Error),
}

impl UploadError {
    /// Returns `true` for limit violations reported verbatim to the client.
    #[must_use]
    pub const fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedField(_) | Self::TooManyFiles | Self::FileTooLarge | Self::TooManyFields
        )
    }

    /// The detail sent back to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_limit() {
            self.to_string()
        } else {
            "Something went wrong while uploading file".to_string()
        }
    }

    fn to_response(&self) -> Response {
        Response::json(
            StatusCode::BAD_REQUEST,
            &json!({ "message": format!("FileUpload: {}", self.client_message()) }),
        )
    }
}

/// Middleware parsing multipart uploads for declared fields.
#[derive(Debug, Clone)]
pub struct UploadStage {
    fields: Vec<FileUploadSpec>,
    options: FileUploadOptions,
}

impl UploadStage {
    /// Creates the stage for the declared `fields`.
    #[must_use]
    pub fn new(fields: Vec<FileUploadSpec>, options: FileUploadOptions) -> Self {
        Self { fields, options }
    }

    /// The declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FileUploadSpec] {
        &self.fields
    }

    fn spec(&self, field: &str) -> Option<&FileUploadSpec> {
        self.fields.iter().find(|spec| spec.name == field)
    }

    async fn parse(
        &self,
        ctx: &mut RequestContext,
        body: Bytes,
        boundary: String,
    ) -> Result<(), UploadError> {
        let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
        let multipart = multer::Multipart::new(stream, boundary);

        let mut values = match ctx.body() {
            Some(Value::Object(existing)) => existing.clone(),
            _ => Map::new(),
        };
        let mut grouped: Vec<(String, Vec<UploadedFile>)> = Vec::new();

        // Files already on disk are removed when a later part is rejected.
        let received = self.receive(multipart, &mut values, &mut grouped).await;
        let described = match received.and_then(|()| self.describe(&grouped)) {
            Ok(described) => described,
            Err(error) => {
                discard(&grouped).await;
                return Err(error);
            }
        };

        values.extend(described);
        for (_, files) in grouped {
            for file in files {
                ctx.push_file(file);
            }
        }
        ctx.set_body(Value::Object(values));
        Ok(())
    }

    async fn receive(
        &self,
        mut multipart: multer::Multipart<'static>,
        values: &mut Map<String, Value>,
        grouped: &mut Vec<(String, Vec<UploadedFile>)>,
    ) -> Result<(), UploadError> {
        let destination = self.options.destination();
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total_files = 0usize;
        let mut total_fields = 0usize;

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            let Some(original) = field.file_name().map(str::to_string) else {
                total_fields += 1;
                if self.options.max_fields.is_some_and(|max| total_fields > max) {
                    return Err(UploadError::TooManyFields);
                }
                let text = field.text().await?;
                values.insert(name, Value::String(text));
                continue;
            };

            let spec = self
                .spec(&name)
                .ok_or_else(|| UploadError::UnexpectedField(name.clone()))?;
            let count = counts.entry(name.clone()).or_default();
            *count += 1;
            if *count > spec.limit() {
                return Err(UploadError::UnexpectedField(name));
            }
            total_files += 1;
            if self.options.max_files.is_some_and(|max| total_files > max) {
                return Err(UploadError::TooManyFiles);
            }

            tokio::fs::create_dir_all(&destination).await?;
            let filename = Uuid::now_v7().simple().to_string();
            let path = destination.join(&filename);
            let mimetype = field
                .content_type()
                .map_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string(), ToString::to_string);

            let size = match self.store(&mut field, &path).await {
                Ok(size) => size,
                Err(error) => {
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(error);
                }
            };

            let file = UploadedFile {
                fieldname: name.clone(),
                originalname: original,
                mimetype,
                destination: destination.clone(),
                filename,
                path,
                size,
            };
            tracing::debug!(
                field = %file.fieldname,
                path = %file.path.display(),
                size = file.size,
                "Stored uploaded file"
            );

            match grouped.iter_mut().find(|(field, _)| *field == name) {
                Some((_, files)) => files.push(file),
                None => grouped.push((name, vec![file])),
            }
        }
        Ok(())
    }

    /// Body entries describing the stored files, one per field.
    fn describe(
        &self,
        grouped: &[(String, Vec<UploadedFile>)],
    ) -> Result<Map<String, Value>, UploadError> {
        let mut described = Map::new();
        for (name, files) in grouped {
            let value = if self.spec(name).is_some_and(FileUploadSpec::is_multiple) {
                serde_json::to_value(files)?
            } else {
                match files.first() {
                    Some(file) => serde_json::to_value(file)?,
                    None => continue,
                }
            };
            described.insert(name.clone(), value);
        }
        Ok(described)
    }

    async fn store(
        &self,
        field: &mut multer::Field<'static>,
        path: &Path,
    ) -> Result<u64, UploadError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            if self.options.max_file_size.is_some_and(|max| size > max) {
                return Err(UploadError::FileTooLarge);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(size)
    }
}

async fn discard(grouped: &[(String, Vec<UploadedFile>)]) {
    for file in grouped.iter().flat_map(|(_, files)| files) {
        if let Err(error) = tokio::fs::remove_file(&file.path).await {
            tracing::warn!(
                path = %file.path.display(),
                error = %error,
                "Failed to remove uploaded file after a rejected upload"
            );
        }
    }
}

impl Middleware for UploadStage {
    fn name(&self) -> &'static str {
        "file-upload"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let boundary = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| multer::parse_boundary(value).ok());
            let Some(boundary) = boundary else {
                return next.run(ctx, request).await;
            };

            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            if let Err(error) = self.parse(ctx, bytes.clone(), boundary).await {
                if error.is_limit() {
                    tracing::debug!(error = %error, "File upload rejected");
                } else {
                    tracing::warn!(error = %error, "File upload failed");
                }
                return error.to_response();
            }

            let request = Request::from_parts(parts, Full::new(bytes));
            next.run(ctx, request).await
        })
    }
}
