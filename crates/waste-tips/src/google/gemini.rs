use std::sync::LazyLock;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::credentials::AccessTokenSource;
use super::media::upload_media_type;
use crate::sorting::{AnalysisGateway, AnalysisRequest, GatewayError};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert on German waste sorting regulations \
and the local rules of German municipalities. Respond only with valid HTML markup. \
Do not wrap the answer in prose, markdown or code fences.";

static BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<body\b[^>]*>(.*?)</body\s*>").expect("body pattern compiles")
});

/// User instruction sent alongside the photo.
pub fn sorting_prompt(postal_code: &str, language_name: &str) -> String {
    format!(
        "Analyze this waste image and explain how to dispose of it in Germany, postal code {postal_code}. \
Identify what kind of waste it is and which bin it belongs in (Restmüll, Gelbe Tonne/Gelber Sack, \
Papiertonne, Biotonne, Glascontainer, etc.). Include local regulations for postal code {postal_code} \
where relevant. Write the answer in {language_name}. Use headings, paragraphs and lists where appropriate."
    )
}

/// Inner content of the first `<body>` element, or the whole text when there is none.
pub fn extract_body(text: &str) -> &str {
    BODY_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(text, |inner| inner.as_str())
        .trim()
}

/// Gemini `generateContent` client on Vertex AI.
#[derive(Debug, Clone)]
pub struct VertexGeminiClient {
    client: Client,
    base_url: String,
    project_id: String,
    location: String,
    model: String,
    credentials: AccessTokenSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// First candidate whose extracted body is non-empty.
    pub(crate) fn first_fragment(&self) -> Result<String, GatewayError> {
        self.candidates
            .iter()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .find_map(|text| {
                let fragment = extract_body(&text);
                (!fragment.is_empty()).then(|| fragment.to_string())
            })
            .ok_or(GatewayError::EmptyResponse)
    }
}

impl VertexGeminiClient {
    pub fn new(
        client: Client,
        project_id: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
        credentials: AccessTokenSource,
    ) -> Self {
        let location = location.into();
        Self {
            client,
            base_url: format!("https://{location}-aiplatform.googleapis.com"),
            project_id: project_id.into(),
            location,
            model: model.into(),
            credentials,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url, self.project_id, self.location, self.model
        )
    }
}

#[async_trait]
impl AnalysisGateway for VertexGeminiClient {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<String, GatewayError> {
        let media_type = upload_media_type(request.image, request.declared_content_type);
        let prompt = sorting_prompt(request.postal_code, request.language_name);

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: &prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: media_type.clone(),
                            data: BASE64.encode(request.image),
                        },
                    },
                ],
            }],
        };

        debug!(
            model = %self.model,
            media_type = %media_type,
            bytes = request.image.len(),
            "sending image to Gemini"
        );

        let bearer = self
            .credentials
            .access_token()
            .await
            .map_err(GatewayError::upstream)?;

        let response = self
            .client
            .post(self.generate_url())
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(GatewayError::upstream)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "Gemini returned {status}: {detail}"
            )));
        }

        let generated: GenerateContentResponse =
            response.json().await.map_err(GatewayError::upstream)?;
        generated.first_fragment()
    }
}
