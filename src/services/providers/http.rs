/// Live generative-AI provider over HTTP
///
/// Speaks the messages-style JSON API: one user message carrying the prompt,
/// text blocks back. Only transport and status are checked here; the text
/// itself is parsed by the advisor source.
use crate::{
    error::{AdvisorError, AppResult},
    services::providers::{AdvisorClient, AdvisorRequest},
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct HttpAdvisorClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl HttpAdvisorClient {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl AdvisorClient for HttpAdvisorClient {
    async fn complete(&self, request: &AdvisorRequest) -> AppResult<String> {
        let url = format!("{}/v1/messages", self.api_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: request.prompt(),
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = self.name(),
                "Advisor request failed"
            );
            return Err(AdvisorError::Unavailable(format!(
                "API returned status {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: MessagesResponse = response.json().await?;
        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        tracing::info!(
            cart_lines = request.cart.len(),
            response_chars = text.len(),
            provider = self.name(),
            "Advisor response received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CartLine, Catalog, CatalogProduct};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AdvisorRequest {
        let catalog = Catalog::new(vec![
            CatalogProduct::new("p1", "Adana Kebap", "Ana Yemek", 320.0),
            CatalogProduct::new("p2", "Ayran", "İçecek", 40.0),
        ]);
        let cart = vec![CartLine::new(catalog.products()[0].clone(), 1)];
        AdvisorRequest::from_snapshot(&cart, &catalog)
    }

    fn client(url: String) -> HttpAdvisorClient {
        HttpAdvisorClient::new(
            "test_key".to_string(),
            url,
            "test-model".to_string(),
            256,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "Here you go:"},
                    {"type": "text", "text": "{\"recommendations\": []}"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(server.uri()).complete(&request()).await.unwrap();
        assert_eq!(text, "Here you go:\n{\"recommendations\": []}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(server.uri()).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("529"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = client("http://advisor.local/".to_string());
        assert_eq!(client.api_url, "http://advisor.local");
    }
}
