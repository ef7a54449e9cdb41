use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = "You are a friendly tutor-matching assistant. \
     Write short, student-friendly explanations.";

const MAX_NEW_TOKENS: u32 = 400;
const TEMPERATURE: f32 = 0.6;

/// Run a single prompt through the configured provider and return the raw
/// generated text.
pub async fn generate(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    if !config.is_enabled() {
        anyhow::bail!("LLM provider '{}' is not configured", config.provider);
    }

    match config.provider.as_str() {
        "huggingface" => call_huggingface(client, config, prompt).await,
        "azure" => call_azure(client, config, prompt).await,
        "openai" => call_openai(client, config, prompt).await,
        "ollama" => call_ollama(client, config, prompt).await,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    }
}

fn timeout(config: &LlmConfig) -> std::time::Duration {
    std::time::Duration::from_secs(config.timeout_secs.clamp(1, 60))
}

async fn send_json<T: Serialize>(
    request: reqwest::RequestBuilder,
    body: &T,
    provider: &str,
) -> Result<reqwest::Response> {
    let resp = request
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to call {provider} API"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{provider} API returned {status}: {body}");
    }
    Ok(resp)
}

// ─── HuggingFace Inference API ───────────────────────────

#[derive(Serialize)]
struct HfRequest {
    inputs: String,
    parameters: HfParameters,
}

#[derive(Serialize)]
struct HfParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

/// HF answers either `[{"generated_text": ...}]` or `{"generated_text": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum HfResponse {
    List(Vec<HfGenerated>),
    Single(HfGenerated),
}

#[derive(Deserialize)]
struct HfGenerated {
    generated_text: String,
}

async fn call_huggingface(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let url = format!(
        "{}/models/{}",
        config.base_url.trim_end_matches('/'),
        config.model
    );
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = HfRequest {
        inputs: format!("{SYSTEM_PROMPT}\n\n{prompt}"),
        parameters: HfParameters {
            max_new_tokens: MAX_NEW_TOKENS,
            temperature: TEMPERATURE,
            return_full_text: false,
        },
    };

    let resp = send_json(
        client
            .post(&url)
            .timeout(timeout(config))
            .header("Authorization", format!("Bearer {api_key}")),
        &req,
        "HuggingFace",
    )
    .await?;

    let body: HfResponse = resp
        .json()
        .await
        .context("Unexpected HuggingFace response format")?;
    match body {
        HfResponse::List(items) => items
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .context("HuggingFace returned an empty list"),
        HfResponse::Single(g) => Ok(g.generated_text),
    }
}

// ─── Chat-completions (Azure OpenAI, OpenAI-compatible) ──

#[derive(Serialize)]
struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
    /// Older completion deployments put the text here
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn chat_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        },
    ]
}

fn first_choice_text(body: ChatCompletionResponse) -> Result<String> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .context("No choices in chat completion response")?;
    Ok(choice
        .message
        .and_then(|m| m.content)
        .or(choice.text)
        .unwrap_or_default())
}

async fn call_azure(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        config.base_url.trim_end_matches('/'),
        config.model,
        config.api_version
    );
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = ChatCompletionRequest {
        model: None,
        messages: chat_messages(prompt),
        max_tokens: MAX_NEW_TOKENS,
        temperature: TEMPERATURE,
    };

    let resp = send_json(
        client
            .post(&url)
            .timeout(timeout(config))
            .header("api-key", api_key),
        &req,
        "Azure OpenAI",
    )
    .await?;

    first_choice_text(resp.json().await?)
}

async fn call_openai(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/'));
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = ChatCompletionRequest {
        model: Some(config.model.clone()),
        messages: chat_messages(prompt),
        max_tokens: MAX_NEW_TOKENS,
        temperature: TEMPERATURE,
    };

    let resp = send_json(
        client
            .post(&url)
            .timeout(timeout(config))
            .header("Authorization", format!("Bearer {api_key}")),
        &req,
        "OpenAI",
    )
    .await?;

    first_choice_text(resp.json().await?)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

async fn call_ollama(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url.trim_end_matches('/'));

    let req = OllamaChatRequest {
        model: config.model.clone(),
        messages: chat_messages(prompt),
        stream: false,
    };

    let resp = send_json(client.post(&url).timeout(timeout(config)), &req, "Ollama").await?;
    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hf_response_list_form() {
        let body: HfResponse =
            serde_json::from_str(r#"[{"generated_text": "hello"}]"#).unwrap();
        assert!(matches!(body, HfResponse::List(ref v) if v[0].generated_text == "hello"));
    }

    #[test]
    fn test_hf_response_object_form() {
        let body: HfResponse = serde_json::from_str(r#"{"generated_text": "hi"}"#).unwrap();
        assert!(matches!(body, HfResponse::Single(ref g) if g.generated_text == "hi"));
    }

    #[test]
    fn test_first_choice_prefers_message_content() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"from message"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(body).unwrap(), "from message");
    }

    #[test]
    fn test_first_choice_falls_back_to_text() {
        let body: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"text":"legacy"}]}"#).unwrap();
        assert_eq!(first_choice_text(body).unwrap(), "legacy");
    }

    #[test]
    fn test_no_choices_is_error() {
        let body: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_choice_text(body).is_err());
    }

    #[test]
    fn test_azure_request_omits_model() {
        let req = ChatCompletionRequest {
            model: None,
            messages: chat_messages("hi"),
            max_tokens: 10,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_disabled_provider_fails_fast() {
        let client = reqwest::Client::new();
        let config = LlmConfig::default();
        let err = generate(&client, &config, "prompt").await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let client = reqwest::Client::new();
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            api_key: Some("k".to_string()),
            ..LlmConfig::default()
        };
        let err = generate(&client, &config, "prompt").await.unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider"));
    }
}
