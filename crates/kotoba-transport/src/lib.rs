//! Kotoba HTTP Transport
//!
//! Implements the [`Oracle`] seam over the service's single-endpoint
//! envelope protocol: every request is a JSON POST of
//! `{ "action": ..., ...parameters }` and every response is
//! `{ "status": "ok" | "error", "data"?, "message"? }`. Delimited
//! content fields are decoded here, at the boundary, so the engine only
//! ever sees typed material.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use kotoba_core::content::{
    decode_pairs, decode_prompts, ExerciseStep, LessonContent, LessonSummary, VerificationResult,
    VocabHint,
};
use kotoba_core::error::{KotobaError, Result};
use kotoba_core::oracle::Oracle;
use kotoba_core::session::{Learner, Role};

// ============================================================================
// Reply envelope
// ============================================================================

/// The service's uniform response envelope.
#[derive(Debug, Deserialize)]
struct Reply {
    status: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: String,
}

/// Extracts the payload from a reply, mapping `status: "error"` to an
/// oracle failure with the service's message passed through.
fn unwrap_reply(action: &str, reply: Reply) -> Result<Value> {
    if reply.status == "ok" {
        return Ok(reply.data);
    }
    let message = if reply.message.is_empty() {
        "the service reported an error".to_string()
    } else {
        reply.message
    };
    Err(KotobaError::oracle(action, message))
}

// ============================================================================
// Wire DTOs
// ============================================================================

/// Accepts an id sent either as a JSON number or as a numeric string.
/// The backing spreadsheet runtime is not consistent about which.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLearner {
    uid: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(deserialize_with = "lenient_u32")]
    progress_id: u32,
}

impl From<RawLearner> for Learner {
    fn from(raw: RawLearner) -> Self {
        let role = if raw.role == "Admin" {
            Role::Admin
        } else {
            Role::Learner
        };
        Self {
            uid: raw.uid,
            display_name: raw.display_name,
            email: raw.email,
            role,
            // A fresh account starts with lesson 1 unlocked.
            progress_id: raw.progress_id.max(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(deserialize_with = "lenient_u32")]
    id: u32,
    #[serde(default)]
    title: String,
}

impl From<RawSummary> for LessonSummary {
    fn from(raw: RawSummary) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
        }
    }
}

/// Lesson material as the service sends it: delimited strings, decoded
/// here into typed pairs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLesson {
    #[serde(deserialize_with = "lenient_u32")]
    id: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    examples: String,
    #[serde(default)]
    quiz_prompts: String,
}

impl From<RawLesson> for LessonContent {
    fn from(raw: RawLesson) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            explanation: decode_pairs(&raw.explanation),
            examples: decode_pairs(&raw.examples),
            quiz_prompts: decode_prompts(&raw.quiz_prompts),
        }
    }
}

/// The hint action returns either a single object or an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

// ============================================================================
// HttpOracle
// ============================================================================

/// [`Oracle`] implementation speaking the envelope protocol over HTTP.
///
/// No request timeout is set on the client: the generation pass may
/// legitimately run for a long time, and bounding the learner's wait is
/// the request gate's job, not the transport's.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOracle {
    /// Creates a transport posting to the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| KotobaError::transport("init", e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint this transport posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one envelope and returns the unwrapped payload.
    #[instrument(skip(self, params), fields(endpoint = %self.endpoint))]
    async fn call(&self, action: &str, params: Value) -> Result<Value> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), Value::String(action.to_string()));
        if let Value::Object(map) = params {
            body.extend(map);
        }

        debug!(action, "posting envelope");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| KotobaError::transport(action, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KotobaError::transport(action, format!("HTTP {status}")));
        }

        let reply: Reply = response
            .json()
            .await
            .map_err(|e| KotobaError::transport(action, format!("malformed response: {e}")))?;
        unwrap_reply(action, reply)
    }

    /// Parses an unwrapped payload into the expected DTO.
    fn parse<T: serde::de::DeserializeOwned>(action: &str, data: Value) -> Result<T> {
        serde_json::from_value(data)
            .map_err(|e| KotobaError::transport(action, format!("unexpected payload: {e}")))
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn login(&self, email: &str, username: &str, password: &str) -> Result<Learner> {
        let data = self
            .call(
                "login",
                json!({ "email": email, "username": username, "password": password }),
            )
            .await?;
        let raw: RawLearner = Self::parse("login", data)?;
        Ok(raw.into())
    }

    async fn lesson_list(&self) -> Result<Vec<LessonSummary>> {
        let data = self.call("getGrammarList", json!({})).await?;
        let raw: Vec<RawSummary> = Self::parse("getGrammarList", data)?;
        Ok(raw.into_iter().map(LessonSummary::from).collect())
    }

    async fn lesson_content(
        &self,
        lesson_id: u32,
        allow_generation: bool,
        force_regenerate: bool,
    ) -> Result<LessonContent> {
        let data = self
            .call(
                "getGrammar",
                json!({
                    "id": lesson_id,
                    "allowGeneration": allow_generation,
                    "forceRegenerate": force_regenerate,
                }),
            )
            .await?;
        let raw: RawLesson = Self::parse("getGrammar", data)?;
        Ok(raw.into())
    }

    async fn vocab_hint(&self) -> Result<Vec<VocabHint>> {
        let data = self.call("getVocabHint", json!({})).await?;
        let raw: OneOrMany<VocabHint> = Self::parse("getVocabHint", data)?;
        Ok(raw.into())
    }

    async fn verify_sentence(
        &self,
        uid: &str,
        lesson_id: u32,
        sentence: &str,
        step: ExerciseStep,
    ) -> Result<VerificationResult> {
        let data = self
            .call(
                "verifySentence",
                json!({
                    "uid": uid,
                    "lessonId": lesson_id,
                    "sentence": sentence,
                    "step": step.wire_name(),
                }),
            )
            .await?;
        Self::parse("verifySentence", data)
    }
}
