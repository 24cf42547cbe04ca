use bytes::Bytes;
use futures_util::{stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::blueprint::Upload;
use crate::http::{ApiClient, ApiError, ApiRequest};
use crate::model::{Note, NoteDraft, Resource};
use crate::validation::{FieldError, Validate, ValidationErrors};

const PDF_MIME: &str = "application/pdf";
const MIB: usize = 1024 * 1024;

/// A note together with the file it describes.
#[derive(Clone, Debug)]
pub struct NoteUpload {
    pub draft: NoteDraft,
    pub file_name: String,
    pub content: Bytes,
}

impl NoteUpload {
    pub fn new<N: Into<String>, C: Into<Bytes>>(draft: NoteDraft, file_name: N, content: C) -> Self {
        Self {
            draft,
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    fn check(&self, limits: &Upload) -> Result<(), ValidationErrors> {
        let mut errors = self
            .draft
            .validate()
            .err()
            .map(|errors| errors.fields().to_vec())
            .unwrap_or_default();

        if !self.file_name.to_ascii_lowercase().ends_with(".pdf") {
            errors.push(FieldError::new("file", "Only PDF files can be uploaded"));
        }
        if self.content.is_empty() {
            errors.push(FieldError::new("file", "File is empty"));
        } else if self.content.len() > limits.max_file_size {
            errors.push(FieldError::new(
                "file",
                format!("File must be at most {}", human_size(limits.max_file_size)),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

/// Bytes of the file handed to the transport so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

pub struct NotesApi<'a> {
    client: &'a ApiClient,
    limits: Upload,
}

impl<'a> NotesApi<'a> {
    pub fn new(client: &'a ApiClient, limits: Upload) -> Self {
        Self { client, limits }
    }

    /// Sends the note as a single multipart request. The file is streamed in
    /// `chunk_size` pieces and every piece is reported on `progress`.
    pub async fn upload(
        &self,
        upload: NoteUpload,
        progress: Option<watch::Sender<UploadProgress>>,
        cancel: &CancellationToken,
    ) -> Result<Note, ApiError> {
        upload.check(&self.limits)?;

        let total = upload.content.len() as u64;
        if let Some(tx) = &progress {
            tx.send_replace(UploadProgress { sent: 0, total });
        }

        let mut sent = 0u64;
        let chunks = split(&upload.content, self.limits.chunk_size);
        let body = stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>)).inspect(
            move |chunk| {
                if let Ok(chunk) = chunk {
                    sent += chunk.len() as u64;
                    if let Some(tx) = &progress {
                        tx.send_replace(UploadProgress { sent, total });
                    }
                }
            },
        );

        let file = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(upload.file_name.clone())
            .mime_str(PDF_MIME)?;
        let form = fields(upload.draft).part("file", file);

        log::info!("Uploading {} ({} bytes)", upload.file_name, total);
        let req = ApiRequest::post(format!("{}/upload", Note::PATH))
            .multipart(form)
            .cancel(cancel.clone());
        self.client.fetch(req).await
    }
}

fn fields(draft: NoteDraft) -> Form {
    let mut form = Form::new().text("title", draft.title);
    let optional = [
        ("description", draft.description),
        ("subject", draft.subject.map(|id| id.to_string())),
        ("standard", draft.standard.map(|id| id.to_string())),
        ("batch", draft.batch.map(|id| id.to_string())),
    ];
    for (name, value) in optional {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            form = form.text(name, value);
        }
    }
    form
}

fn split(content: &Bytes, size: usize) -> Vec<Bytes> {
    let size = size.max(1);
    (0..content.len())
        .step_by(size)
        .map(|start| content.slice(start..(start + size).min(content.len())))
        .collect()
}

fn human_size(bytes: usize) -> String {
    if bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::http::client::tests::api_client;
    use crate::model::EntityId;

    const PDF: &[u8] = b"%PDF-1.4 algebra worksheet";

    fn limits() -> Upload {
        Upload {
            max_file_size: 64,
            chunk_size: 4,
        }
    }

    fn draft() -> NoteDraft {
        NoteDraft::default()
            .title("Quadratics")
            .subject(EntityId::new("sub1"))
            .batch(EntityId::new("b1"))
    }

    #[test]
    fn test_split() {
        let chunks = split(&Bytes::from_static(b"abcdefghij"), 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
        assert!(split(&Bytes::new(), 4).is_empty());
    }

    #[test]
    fn test_percent() {
        assert_eq!(UploadProgress { sent: 5, total: 20 }.percent(), 25);
        assert_eq!(UploadProgress::default().percent(), 0);
    }

    #[test]
    fn test_file_checks() {
        let errors = NoteUpload::new(NoteDraft::default(), "notes.docx", vec![0u8; 65])
            .check(&limits())
            .unwrap_err();
        let messages = errors
            .fields()
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec![
                "title: Title is required",
                "subject: Subject is required",
                "file: Only PDF files can be uploaded",
                "file: File must be at most 64 bytes",
            ]
        );

        let ten_mib = Upload {
            max_file_size: 10 * MIB,
            chunk_size: 4,
        };
        assert!(NoteUpload::new(draft(), "Week1.PDF", PDF).check(&ten_mib).is_ok());
        assert_eq!(human_size(ten_mib.max_file_size), "10 MB");
    }

    #[tokio::test]
    async fn test_upload_reports_progress() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/notes/upload")
                .body_contains("name=\"title\"")
                .body_contains("Quadratics")
                .body_contains("filename=\"week1.pdf\"")
                .body_contains("%PDF-1.4 algebra worksheet");
            then.status(201).json_body(json!({
                "success": true,
                "data": {"_id": "n1", "title": "Quadratics", "fileName": "week1.pdf"}
            }));
        });

        let client = api_client(server.base_url());
        let (tx, rx) = watch::channel(UploadProgress::default());
        let note = NotesApi::new(&client, limits())
            .upload(
                NoteUpload::new(draft(), "week1.pdf", PDF),
                Some(tx),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        mock.assert();
        assert_eq!(note.file_name.as_deref(), Some("week1.pdf"));
        let done = *rx.borrow();
        assert_eq!(done.total, PDF.len() as u64);
        assert_eq!(done.sent, done.total);
        assert_eq!(done.percent(), 100);
    }

    #[tokio::test]
    async fn test_invalid_upload_is_not_sent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/notes/upload");
            then.status(201).json_body(json!({"_id": "n1"}));
        });

        let client = api_client(server.base_url());
        let err = NotesApi::new(&client, limits())
            .upload(
                NoteUpload::new(draft(), "week1.png", PDF),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(mock.hits(), 0);
        assert_eq!(
            err.user_message("Failed to upload note"),
            "file: Only PDF files can be uploaded"
        );
    }
}
