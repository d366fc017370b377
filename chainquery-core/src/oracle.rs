//! Text-to-SQL oracle interface and the Anthropic Messages API client

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::reader::Schema;
use crate::{Error, Result};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// What is known about one table's columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnDescriptor {
    /// Column name to type tag
    Typed(Schema),
    /// Column names only; `*` when nothing is known
    Names(Vec<String>),
}

/// Schema hint for one alias in a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaHint {
    pub alias: String,
    pub columns: ColumnDescriptor,
}

/// Everything the oracle gets to answer one question
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub question: String,
    pub schema: Vec<SchemaHint>,
    pub existing_sql: String,
    pub temperature: f32,
}

/// Natural-language to SQL generator
pub trait SqlOracle: Send + Sync {
    /// Return SQL answering the request; the text is not validated
    fn generate(&self, request: &OracleRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Prompt text for a request
pub fn build_prompt(request: &OracleRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You write SQL for an analytical SQL engine.\n\
         Rewrite or extend the existing query so that it answers the question.\n\
         Keep the table functions and aliases of the existing query.\n\
         Answer with a single SQL statement and nothing else.\n\n",
    );

    prompt.push_str("Tables:\n");
    for hint in &request.schema {
        match &hint.columns {
            ColumnDescriptor::Typed(columns) => {
                prompt.push_str(&format!("- {}\n", hint.alias));
                for (name, ty) in columns {
                    prompt.push_str(&format!("    {}: {}\n", name, ty));
                }
            }
            ColumnDescriptor::Names(names) => {
                prompt.push_str(&format!("- {} ({})\n", hint.alias, names.join(", ")));
            }
        }
    }

    prompt.push_str("\nExisting query:\n```sql\n");
    prompt.push_str(&request.existing_sql);
    prompt.push_str("\n```\n\nQuestion: ");
    prompt.push_str(&request.question);
    prompt.push('\n');
    prompt
}

/// Drop markdown code fences around model output
pub fn strip_sql_fences(text: &str) -> String {
    text.trim()
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Oracle backed by the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicOracle {
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("oracle api_key is not set"))?;
        if config.timeout_secs == 0 {
            return Err(Error::config("oracle timeout_secs must be > 0"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::oracle(format!("http client build failed: {e}")))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(&self, request: &OracleRequest) -> JsonValue {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": request.temperature,
            "messages": [
                { "role": "user", "content": build_prompt(request) }
            ],
        })
    }
}

impl SqlOracle for AnthropicOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String> {
        debug!(
            model = %self.model,
            temperature = request.temperature,
            "sending oracle request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| Error::oracle(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = %status, "oracle request rejected");
            return Err(Error::oracle(format!("status {}", status.as_u16())));
        }

        let body: JsonValue = resp
            .json()
            .await
            .map_err(|e| Error::oracle(format!("invalid response JSON: {e}")))?;
        first_text_block(&body).map(|text| strip_sql_fences(&text))
    }
}

/// First `text` content block of a Messages API response
pub fn first_text_block(body: &JsonValue) -> Result<String> {
    body.get("content")
        .and_then(JsonValue::as_array)
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|block| block.get("type").and_then(JsonValue::as_str) == Some("text"))
        })
        .and_then(|block| block.get("text"))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::oracle("response has no text content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OracleRequest {
        let mut typed = Schema::new();
        typed.insert("id".to_string(), "Int64".to_string());
        typed.insert("text".to_string(), "String".to_string());
        OracleRequest {
            question: "How many comments per user?".to_string(),
            schema: vec![
                SchemaHint {
                    alias: "comments".to_string(),
                    columns: ColumnDescriptor::Typed(typed),
                },
                SchemaHint {
                    alias: "u".to_string(),
                    columns: ColumnDescriptor::Names(vec!["id".to_string(), "name".to_string()]),
                },
            ],
            existing_sql: "SELECT comments.* FROM Python(reader) AS comments".to_string(),
            temperature: 0.0,
        }
    }

    fn config(api_key: Option<&str>) -> OracleConfig {
        OracleConfig {
            api_key: api_key.map(str::to_string),
            ..OracleConfig::default()
        }
    }

    #[test]
    fn test_prompt_lists_schema_sql_and_question() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("- comments\n    id: Int64\n    text: String\n"));
        assert!(prompt.contains("- u (id, name)\n"));
        assert!(prompt.contains("```sql\nSELECT comments.* FROM Python(reader) AS comments\n```"));
        assert!(prompt.ends_with("Question: How many comments per user?\n"));
    }

    #[test]
    fn test_strip_sql_fences() {
        assert_eq!(strip_sql_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_sql_fences("  SELECT 2  "), "SELECT 2");
    }

    #[test]
    fn test_first_text_block() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "```sql\nSELECT 1\n```"}
            ]
        });
        assert_eq!(first_text_block(&body).unwrap(), "```sql\nSELECT 1\n```");

        let err = first_text_block(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, Error::Oracle { .. }));
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(matches!(
            AnthropicOracle::new(&config(None)),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            AnthropicOracle::new(&config(Some("  "))),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_new_rejects_zero_timeout() {
        let config = OracleConfig {
            timeout_secs: 0,
            ..config(Some("key"))
        };
        assert!(matches!(
            AnthropicOracle::new(&config),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_request_body() {
        let oracle = AnthropicOracle::new(&config(Some("key"))).unwrap();
        let body = oracle.body(&request());
        assert_eq!(body["model"], json!(oracle.model()));
        assert_eq!(body["max_tokens"], json!(64000));
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["messages"][0]["role"], json!("user"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_oracle_error() {
        let config = OracleConfig {
            endpoint: "http://127.0.0.1:9/v1/messages".to_string(),
            timeout_secs: 2,
            ..config(Some("key"))
        };
        let oracle = AnthropicOracle::new(&config).unwrap();
        let err = oracle.generate(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Oracle { .. }));
    }
}
