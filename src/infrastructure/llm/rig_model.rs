use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::{CompletionModel, ToolDefinition};
use rig::message::{AssistantContent, Message as RigMessage, ToolResultContent, UserContent};
use rig::providers::{anthropic, gemini, openai};
use rig::OneOrMany;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::ports::{ChatModel, ModelRequest, ModelResponse};
use crate::domain::{DomainError, Message, ToolInvocation};
use crate::infrastructure::config::LlmConfig;

/// Any rig completion model, driven one step at a time.
pub struct RigChatModel<M> {
    model: M,
    temperature: f64,
}

impl<M: CompletionModel> RigChatModel<M> {
    pub fn new(model: M, temperature: f64) -> Self {
        Self { model, temperature }
    }
}

/// Builds the configured provider's model. API keys come from the provider's
/// usual environment variable.
pub fn chat_model_from_config(config: &LlmConfig) -> Result<Arc<dyn ChatModel>, DomainError> {
    let t = config.temperature;
    let model: Arc<dyn ChatModel> = match config.provider.as_str() {
        "gemini" => Arc::new(RigChatModel::new(
            gemini::Client::from_env().completion_model(&config.model),
            t,
        )),
        "anthropic" => Arc::new(RigChatModel::new(
            anthropic::Client::from_env().completion_model(&config.model),
            t,
        )),
        "openai" => Arc::new(RigChatModel::new(
            openai::Client::from_env().completion_model(&config.model),
            t,
        )),
        other => {
            return Err(DomainError::validation(format!(
                "unsupported llm provider: {other}"
            )))
        }
    };
    Ok(model)
}

#[async_trait]
impl<M> ChatModel for RigChatModel<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, DomainError> {
        let mut history = to_rig_messages(request.messages)?;
        let prompt = history
            .pop()
            .ok_or_else(|| DomainError::model("cannot prompt with an empty conversation"))?;

        let tools: Vec<ToolDefinition> = request
            .tools
            .iter()
            .map(|spec| ToolDefinition {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            })
            .collect();

        let response = self
            .model
            .completion_request(prompt)
            .preamble(request.system)
            .messages(history)
            .tools(tools)
            .temperature(self.temperature)
            .send()
            .await
            .map_err(|e| DomainError::model(e.to_string()))?;

        let parsed = from_choice(response.choice);
        debug!(tool_calls = parsed.tool_calls.len(), "model responded");
        Ok(parsed)
    }
}

/// Converts the log into provider turns. Consecutive tool results collapse
/// into a single user turn, which is how providers expect parallel results.
pub(crate) fn to_rig_messages(messages: &[Message]) -> Result<Vec<RigMessage>, DomainError> {
    let mut out = Vec::with_capacity(messages.len());
    let mut results: Vec<UserContent> = Vec::new();

    for msg in messages {
        match msg {
            Message::Tool {
                call_id, content, ..
            } => {
                results.push(UserContent::tool_result(
                    call_id.clone(),
                    OneOrMany::one(ToolResultContent::text(content.clone())),
                ));
            }
            Message::Human { content } => {
                flush_results(&mut out, &mut results)?;
                out.push(RigMessage::user(content.clone()));
            }
            Message::Ai {
                content,
                tool_calls,
            } => {
                flush_results(&mut out, &mut results)?;

                let mut parts = Vec::with_capacity(tool_calls.len() + 1);
                if !content.is_empty() || tool_calls.is_empty() {
                    parts.push(AssistantContent::text(content.clone()));
                }
                parts.extend(tool_calls.iter().map(|call| {
                    AssistantContent::tool_call(
                        call.id.clone(),
                        call.name.clone(),
                        call.arguments.clone(),
                    )
                }));

                out.push(RigMessage::Assistant {
                    id: None,
                    content: OneOrMany::many(parts)
                        .map_err(|e| DomainError::internal(e.to_string()))?,
                });
            }
        }
    }

    flush_results(&mut out, &mut results)?;
    Ok(out)
}

fn flush_results(
    out: &mut Vec<RigMessage>,
    results: &mut Vec<UserContent>,
) -> Result<(), DomainError> {
    if results.is_empty() {
        return Ok(());
    }
    let content =
        OneOrMany::many(std::mem::take(results)).map_err(|e| DomainError::internal(e.to_string()))?;
    out.push(RigMessage::User { content });
    Ok(())
}

pub(crate) fn from_choice(choice: OneOrMany<AssistantContent>) -> ModelResponse {
    let mut text = Vec::new();
    let mut tool_calls = Vec::new();

    for part in choice {
        match part {
            AssistantContent::Text(t) => text.push(t.text),
            AssistantContent::ToolCall(call) => tool_calls.push(ToolInvocation::new(
                call.id,
                call.function.name,
                call.function.arguments,
            )),
            _ => {}
        }
    }

    ModelResponse {
        content: text.join("\n"),
        tool_calls,
    }
}
