use std::{collections::HashSet, sync::Arc};

use {
    shion_agents::{FileUpload, GenerationService},
    shion_channels::{AttachmentReader, InboundAttachment},
    shion_common::UploadedFile,
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

/// Mime type used when the platform does not report one.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Moves inbound attachments into the generation service's file store.
pub struct AttachmentUploader {
    generation: Arc<dyn GenerationService>,
    reader: Arc<dyn AttachmentReader>,
}

impl AttachmentUploader {
    pub fn new(generation: Arc<dyn GenerationService>, reader: Arc<dyn AttachmentReader>) -> Self {
        Self { generation, reader }
    }

    /// Read one attachment from the platform and upload it.
    pub async fn upload(&self, attachment: &InboundAttachment) -> Result<UploadedFile> {
        let bytes = self
            .reader
            .read(attachment)
            .await
            .map_err(|e| Error::upload(&attachment.filename, e))?;

        let upload = FileUpload {
            bytes,
            display_name: attachment.filename.clone(),
            key: attachment.id.clone(),
            mime_type: attachment
                .content_type
                .clone()
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
        };

        let file = self
            .generation
            .upload_file(upload)
            .await
            .map_err(|e| Error::upload(&attachment.filename, e))?;
        debug!(
            attachment_id = %attachment.id,
            file = %file.name,
            mime_type = %file.mime_type,
            "attachment uploaded"
        );
        Ok(file)
    }

    /// Upload a message's attachments in order.
    ///
    /// Attachments repeating an id already seen in the batch are skipped. If
    /// any upload fails the files uploaded so far are released and the error
    /// is returned.
    pub async fn upload_all(&self, attachments: &[InboundAttachment]) -> Result<Vec<UploadedFile>> {
        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            if !seen.insert(attachment.id.as_str()) {
                debug!(attachment_id = %attachment.id, "duplicate attachment skipped");
                continue;
            }
            match self.upload(attachment).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    self.release(&files).await;
                    return Err(e);
                },
            }
        }
        Ok(files)
    }

    /// Delete files from the remote store. Failures are logged and skipped.
    pub async fn release(&self, files: &[UploadedFile]) {
        for file in files {
            if let Err(e) = self.generation.delete_file(&file.name).await {
                warn!(file = %file.name, error = %e, "failed to delete remote file");
            }
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use crate::testing::{MockGeneration, MockReader, attachment};

    use super::*;

    fn uploader(generation: &Arc<MockGeneration>, reader: MockReader) -> AttachmentUploader {
        AttachmentUploader::new(generation.clone(), Arc::new(reader))
    }

    #[tokio::test]
    async fn upload_maps_attachment_metadata() {
        let generation = Arc::new(MockGeneration::default());
        let up = uploader(&generation, MockReader::default());

        let file = up
            .upload(&attachment("42", "cat.png", Some("image/png")))
            .await
            .unwrap();
        assert_eq!(file.key, "42");

        let uploads = generation.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].display_name, "cat.png");
        assert_eq!(uploads[0].key, "42");
        assert_eq!(uploads[0].mime_type, "image/png");
        assert_eq!(uploads[0].bytes, b"bytes of cat.png");
    }

    #[tokio::test]
    async fn missing_content_type_falls_back() {
        let generation = Arc::new(MockGeneration::default());
        let up = uploader(&generation, MockReader::default());
        up.upload(&attachment("1", "blob", None)).await.unwrap();
        assert_eq!(generation.uploads()[0].mime_type, FALLBACK_MIME_TYPE);
    }

    #[tokio::test]
    async fn upload_all_keeps_order_and_skips_duplicate_ids() {
        let generation = Arc::new(MockGeneration::default());
        let up = uploader(&generation, MockReader::default());

        let files = up
            .upload_all(&[
                attachment("1", "a.png", Some("image/png")),
                attachment("2", "b.pdf", Some("application/pdf")),
                attachment("1", "a.png", Some("image/png")),
            ])
            .await
            .unwrap();

        let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2"]);
        assert_eq!(generation.uploads().len(), 2);
    }

    #[tokio::test]
    async fn failed_batch_releases_earlier_uploads() {
        let generation = Arc::new(MockGeneration {
            fail_upload_key: Some("3".into()),
            ..Default::default()
        });
        let up = uploader(&generation, MockReader::default());

        let err = up
            .upload_all(&[
                attachment("1", "a.png", Some("image/png")),
                attachment("2", "b.png", Some("image/png")),
                attachment("3", "c.png", Some("image/png")),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upload { ref filename, .. } if filename == "c.png"));
        assert_eq!(generation.deleted(), vec!["files/1", "files/2"]);
    }

    #[tokio::test]
    async fn read_failure_is_an_upload_error() {
        let generation = Arc::new(MockGeneration::default());
        let up = uploader(&generation, MockReader {
            fail_id: Some("9".into()),
        });

        let err = up
            .upload(&attachment("9", "gone.png", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload { .. }));
        assert!(generation.uploads().is_empty());
    }

    #[tokio::test]
    async fn release_continues_past_delete_failures() {
        let generation = Arc::new(MockGeneration {
            fail_delete: true,
            ..Default::default()
        });
        let up = uploader(&generation, MockReader::default());

        let a = up.upload(&attachment("1", "a", None)).await.unwrap();
        let b = up.upload(&attachment("2", "b", None)).await.unwrap();
        up.release(&[a, b]).await;
        assert_eq!(generation.delete_attempts(), 2);
    }
}
