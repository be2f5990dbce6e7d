use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::job_offer::JobOffer;

/// CV text beyond this many characters is dropped before prompting.
pub const MAX_PROMPT_CV_CHARS: usize = 20_000;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are an impartial recruitment expert. \
Ignore entirely the candidate's name, first name, gender, origin, age, photo, address and family situation. \
Judge only skills, experience and soft skills relevant to the position. Be factual.";

/// Opaque text-in, text-out completion service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Chat-completions client. Without an API key every call fails, which the callers treat
/// as a per-application failure.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(client: Client, api_key: Option<String>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            model,
            timeout,
        }
    }

    async fn chat_openai(&self, payload: JsonValue) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is not configured".to_string()))?;

        let res = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("OpenAI API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response format").into())
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.2
        });
        self.chat_openai(payload).await
    }
}

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

fn truncate_cv(cv_text: &str) -> String {
    cv_text.chars().take(MAX_PROMPT_CV_CHARS).collect()
}

fn offer_section(offer: &JobOffer) -> String {
    format!(
        "--- OFFER ---\nTitle: {}\nDescription: {}",
        offer.title, offer.description
    )
}

/// Asks for `{"score": <0-100>, "resume": "<two sentences>"}` and nothing else.
pub fn scoring_prompt(offer: &JobOffer, cv_text: &str) -> String {
    format!(
        "MISSION:\nAssess how relevant the CV below is to the job offer.\n\n{}\n\n--- CANDIDATE CV ---\n{}\n\n\
--- EXPECTED ANSWER FORMAT (JSON) ---\nAnswer ONLY with this JSON, nothing else:\n\
{{\n  \"score\": <integer between 0 and 100>,\n  \"resume\": \"<your objective analysis in 2 sentences at most>\"\n}}",
        offer_section(offer),
        truncate_cv(cv_text)
    )
}

pub fn summary_prompt(offer: &JobOffer, cv_text: &str) -> String {
    format!(
        "Write a concise summary (5 bullet points at most) of this candidate's profile for the recruiter, \
focusing on strengths and gaps for the position.\n\n{}\n\n--- CANDIDATE CV ---\n{}",
        offer_section(offer),
        truncate_cv(cv_text)
    )
}

pub fn interview_questions_prompt(offer: &JobOffer, cv_text: &str) -> String {
    format!(
        "Suggest 5 interview questions tailored to this candidate and position. \
Target the experience claimed in the CV and the gaps against the offer. Number the questions.\n\n{}\n\n--- CANDIDATE CV ---\n{}",
        offer_section(offer),
        truncate_cv(cv_text)
    )
}
