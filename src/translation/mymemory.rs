// MyMemory translation provider
//
// Free public API, no key required:
//   GET https://api.mymemory.translated.net/get?q=<text>&langpair=<src>|<tgt>

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::language::resolve_pair;
use super::{Translation, Translator};
use crate::error::TranslateError;

pub const DEFAULT_ENDPOINT: &str = "https://api.mymemory.translated.net/get";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
    /// Usually a number, occasionally a string such as `"403"`.
    #[serde(rename = "responseStatus", default)]
    response_status: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText", default)]
    translated_text: Option<String>,
}

/// Extract the translated text from a response body.
///
/// Success requires `responseStatus == 200` and a non-empty `translatedText`.
pub fn parse_response(body: &str) -> Result<String, TranslateError> {
    let response: MyMemoryResponse =
        serde_json::from_str(body).map_err(|e| TranslateError::Malformed(e.to_string()))?;

    let status = match &response.response_status {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    let text = response
        .response_data
        .and_then(|d| d.translated_text)
        .unwrap_or_default();

    if status == 200 && !text.is_empty() {
        Ok(text)
    } else {
        Err(TranslateError::BadStatus(status))
    }
}

#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl MyMemoryTranslator {
    pub fn new() -> Result<Self, TranslateError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let (from, to) = resolve_pair(text, source, target);
        let langpair = format!("{from}|{to}");
        debug!("MyMemory request langpair={}", langpair);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslateError::Timeout
                } else {
                    TranslateError::Network(e)
                }
            })?;
        let body = response.text().await?;
        let translated = parse_response(&body)?;

        Ok(Translation {
            text: translated,
            source: from,
            target: to,
            provider: self.name().to_string(),
        })
    }

    fn name(&self) -> &str {
        "MyMemory"
    }
}
