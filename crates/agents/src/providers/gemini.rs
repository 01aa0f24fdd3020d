//! Gemini REST client: Files API (resumable upload, status polling, delete)
//! and `generateContent`.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::StatusCode,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, trace, warn},
};

use {
    shion_common::{Content, Part, Role, UploadedFile},
    shion_config::GeminiConfig,
};

use crate::{
    error::{Error, Result},
    model::{FileUpload, GenerateRequest, Generation, GenerationService, Usage},
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_POLLS: u32 = 30;

/// The Files API accepts ids of lowercase alphanumerics and dashes, up to 40 chars.
const MAX_FILE_ID_LEN: usize = 40;

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    StateUnspecified,
}

/// File resource as returned by the Files API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFile {
    /// Resource name, e.g. "files/abc-123".
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub state: FileState,
}

impl GeminiFile {
    fn into_uploaded(self, key: &str, fallback_mime: &str, fallback_name: &str) -> UploadedFile {
        UploadedFile {
            name: self.name,
            uri: self.uri,
            mime_type: if self.mime_type.is_empty() {
                fallback_mime.to_string()
            } else {
                self.mime_type
            },
            display_name: if self.display_name.is_empty() {
                fallback_name.to_string()
            } else {
                self.display_name
            },
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: GeminiFile,
}

enum UploadStart {
    /// Resumable session URL to send the bytes to.
    Session(String),
    /// A file with this id is already stored.
    Exists,
}

pub struct GeminiClient {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
    max_polls: u32,
}

impl GeminiClient {
    pub fn new(api_key: Secret<String>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// Build a client from config, routing traffic through `proxy` when set.
    pub fn from_config(config: &GeminiConfig, proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }
        Ok(Self::new(
            config.token.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )
        .with_http_client(builder.build()?))
    }

    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Override how long to wait for uploaded files to finish processing.
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn start_upload(&self, upload: &FileUpload, file_id: &str) -> Result<UploadStart> {
        let url = format!("{}/upload/v1beta/files", self.base_url);
        let body = serde_json::json!({
            "file": {
                "name": format!("files/{file_id}"),
                "displayName": upload.display_name,
            }
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header(
                "X-Goog-Upload-Header-Content-Length",
                upload.bytes.len().to_string(),
            )
            .header("X-Goog-Upload-Header-Content-Type", &upload.mime_type)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            return Ok(UploadStart::Exists);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::api("gemini upload start", status, body));
        }

        resp.headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(|v| UploadStart::Session(v.to_string()))
            .ok_or_else(|| Error::message("gemini upload start: missing x-goog-upload-url header"))
    }

    async fn finalize_upload(&self, session_url: &str, bytes: Vec<u8>) -> Result<GeminiFile> {
        let resp = self
            .client
            .post(session_url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::api("gemini upload finalize", status, body));
        }
        Ok(resp.json::<FileEnvelope>().await?.file)
    }

    /// Fetch a file resource by name ("files/...").
    pub async fn get_file(&self, name: &str) -> Result<GeminiFile> {
        let url = format!("{}/v1beta/{name}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::api("gemini get file", status, body));
        }
        Ok(resp.json::<GeminiFile>().await?)
    }

    /// Poll until the file leaves `PROCESSING` (video and large documents
    /// are processed asynchronously; images are usually active immediately).
    async fn wait_until_active(&self, mut file: GeminiFile) -> Result<GeminiFile> {
        let mut polls = 0;
        loop {
            match file.state {
                FileState::Active | FileState::StateUnspecified => return Ok(file),
                FileState::Failed => {
                    return Err(Error::message(format!(
                        "gemini failed to process file {}",
                        file.name
                    )));
                },
                FileState::Processing => {},
            }
            if polls >= self.max_polls {
                return Err(Error::message(format!(
                    "gemini file {} still processing after {polls} polls",
                    file.name
                )));
            }
            polls += 1;
            trace!(file = %file.name, polls, "gemini file still processing");
            tokio::time::sleep(self.poll_interval).await;
            file = self.get_file(&file.name).await?;
        }
    }
}

/// Map a platform attachment key onto a valid Files API id.
fn file_id_for_key(key: &str) -> String {
    let id: String = key
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() { c } else { '-' }
        })
        .take(MAX_FILE_ID_LEN)
        .collect();
    let id = id.trim_matches('-');
    if id.is_empty() {
        "attachment".into()
    } else {
        id.to_string()
    }
}

fn to_gemini_part(part: &Part) -> serde_json::Value {
    match part {
        Part::Text { text } => serde_json::json!({ "text": text }),
        Part::File { uri, mime_type } => serde_json::json!({
            "fileData": {
                "mimeType": mime_type,
                "fileUri": uri,
            }
        }),
    }
}

fn to_gemini_content(role: Role, parts: &[Part]) -> serde_json::Value {
    serde_json::json!({
        "role": role.as_str(),
        "parts": parts.iter().map(to_gemini_part).collect::<Vec<_>>(),
    })
}

/// Build a `generateContent` body: history first, then the active user turn.
fn build_generate_body(request: &GenerateRequest) -> serde_json::Value {
    let mut contents: Vec<serde_json::Value> = request
        .history
        .iter()
        .map(|c: &Content| to_gemini_content(c.role, &c.parts))
        .collect();
    contents.push(to_gemini_content(Role::User, &request.turn));

    let mut body = serde_json::json!({ "contents": contents });
    if let Some(ref sys) = request.system_instruction {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{ "text": sys }]
        });
    }
    body
}

/// Extract text content from Gemini response parts.
fn extract_text(parts: &[serde_json::Value]) -> Option<String> {
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join(""))
    }
}

/// Missing counts read as zero; counts past `u32::MAX` saturate.
fn token_count(value: &serde_json::Value) -> u32 {
    value
        .as_u64()
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Explain why a response carried no text (safety block, token limit, ...).
fn empty_reason(resp: &serde_json::Value) -> String {
    resp["promptFeedback"]["blockReason"]
        .as_str()
        .or_else(|| resp["candidates"][0]["finishReason"].as_str())
        .unwrap_or("no candidates")
        .to_string()
}

#[async_trait]
impl GenerationService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<UploadedFile> {
        let file_id = file_id_for_key(&upload.key);
        debug!(
            file_id = %file_id,
            display_name = %upload.display_name,
            mime_type = %upload.mime_type,
            size = upload.bytes.len(),
            "gemini upload"
        );

        let start = self.start_upload(&upload, &file_id).await?;
        let FileUpload {
            bytes,
            display_name,
            key,
            mime_type,
        } = upload;

        let file = match start {
            UploadStart::Session(url) => self.finalize_upload(&url, bytes).await?,
            UploadStart::Exists => {
                debug!(file_id = %file_id, "gemini file already stored, reusing it");
                self.get_file(&format!("files/{file_id}")).await?
            },
        };

        let file = self.wait_until_active(file).await?;
        Ok(file.into_uploaded(&key, &mime_type, &display_name))
    }

    async fn delete_file(&self, name: &str) -> Result<()> {
        let url = format!("{}/v1beta/{name}", self.base_url);
        let resp = self
            .client
            .delete(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(file = name, "gemini file already gone");
            return Ok(());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::api("gemini delete file", status, body));
        }
        debug!(file = name, "gemini file deleted");
        Ok(())
    }

    async fn generate(&self, request: GenerateRequest) -> Result<Generation> {
        let body = build_generate_body(&request);

        debug!(
            model = %self.model,
            history_len = request.history.len(),
            turn_parts = request.turn.len(),
            has_system = request.system_instruction.is_some(),
            "gemini generate request"
        );
        trace!(body = %serde_json::to_string(&body).unwrap_or_default(), "gemini request body");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let http_resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body_text, "gemini API error");
            return Err(Error::api("gemini generateContent", status, body_text));
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "gemini raw response");

        let parts = resp["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let Some(text) = extract_text(&parts).filter(|t| !t.trim().is_empty()) else {
            return Err(Error::message(format!(
                "gemini returned no text ({})",
                empty_reason(&resp)
            )));
        };

        let usage = Usage {
            input_tokens: token_count(&resp["usageMetadata"]["promptTokenCount"]),
            output_tokens: token_count(&resp["usageMetadata"]["candidatesTokenCount"]),
        };

        Ok(Generation { text, usage })
    }
}
