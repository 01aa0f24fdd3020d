use {
    async_trait::async_trait,
    shion_channels::{AttachmentReader, Error, InboundAttachment, Result},
    tracing::debug,
};

/// Downloads attachments from Discord's CDN.
pub struct HttpAttachmentReader {
    client: reqwest::Client,
}

impl HttpAttachmentReader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Reader whose requests go through `proxy` when set.
    pub fn with_proxy(proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(url) = proxy {
            let proxy = reqwest::Proxy::all(url).map_err(|e| Error::external("invalid proxy", e))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| Error::external("failed to build http client", e))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl AttachmentReader for HttpAttachmentReader {
    async fn read(&self, attachment: &InboundAttachment) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(&attachment.url)
            .send()
            .await
            .map_err(|e| Error::external("attachment download failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::unavailable(format!(
                "attachment {} download returned HTTP {status}",
                attachment.id
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::external("attachment body read failed", e))?;
        debug!(
            attachment_id = %attachment.id,
            size = bytes.len(),
            "attachment downloaded"
        );
        Ok(bytes.to_vec())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn attachment(url: String) -> InboundAttachment {
        InboundAttachment {
            id: "99".into(),
            filename: "notes.txt".into(),
            content_type: Some("text/plain".into()),
            url,
        }
    }

    #[tokio::test]
    async fn reads_attachment_bytes() {
        let base = serve(Router::new().route("/a/notes.txt", get(|| async { "file body" }))).await;
        let reader = HttpAttachmentReader::with_proxy(None).unwrap();

        let bytes = reader
            .read(&attachment(format!("{base}/a/notes.txt")))
            .await
            .unwrap();
        assert_eq!(bytes, b"file body");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve(Router::new().route(
            "/a/notes.txt",
            get(|| async { (StatusCode::FORBIDDEN, "expired") }),
        ))
        .await;
        let reader = HttpAttachmentReader::with_proxy(None).unwrap();

        let err = reader
            .read(&attachment(format!("{base}/a/notes.txt")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
