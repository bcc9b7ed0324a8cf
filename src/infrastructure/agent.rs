use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::ports::{ChatModel, CheckpointStore, ModelRequest};
use crate::domain::{Conversation, DomainError, Message, ThreadId, ToolInvocation};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::tools::ToolRegistry;

/// Conversational agent that alternates between asking the model and running
/// the tools it requests, checkpointing the thread after every turn.
///
/// Turns on the same thread must not overlap: the checkpoint is loaded at the
/// start and replaced at the end, so concurrent turns lose updates. Callers
/// hold a [`ThreadLocks`](crate::infrastructure::ThreadLocks) guard per turn.
pub struct ChatAgent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    checkpoints: Arc<dyn CheckpointStore>,
    system_prompt: String,
    max_iterations: usize,
}

impl ChatAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        checkpoints: Arc<dyn CheckpointStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            model,
            tools,
            checkpoints,
            system_prompt: config.prompts.agent.system.clone(),
            max_iterations: config.config.agent.max_iterations,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Runs one turn of `thread_id` and returns the model's final answer.
    ///
    /// The thread's log, including everything appended during this turn, is
    /// saved before returning, whether the turn succeeded or not.
    #[instrument(skip(self, query), fields(thread_id = %thread_id))]
    pub async fn run(&self, thread_id: &ThreadId, query: &str) -> Result<String, DomainError> {
        let mut conversation = match self.checkpoints.load(thread_id).await? {
            Some(conversation) => {
                debug!(messages = conversation.len(), "resuming thread");
                conversation
            }
            None => Conversation::new(thread_id.clone()),
        };

        conversation.push(Message::human(query));
        let outcome = self.drive(&mut conversation).await;

        match (outcome, self.checkpoints.save(&conversation).await) {
            (Ok(answer), Ok(())) => {
                info!(messages = conversation.len(), "turn completed");
                Ok(answer)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(save_err)) => {
                error!(error = %save_err, "checkpoint save failed after turn error");
                Err(e)
            }
        }
    }

    /// Checkpointed log of a thread, if any.
    pub async fn history(&self, thread_id: &ThreadId) -> Result<Option<Conversation>, DomainError> {
        self.checkpoints.load(thread_id).await
    }

    fn system_instruction(&self) -> String {
        self.system_prompt.replace("{tools}", &self.tools.names().join(", "))
    }

    async fn drive(&self, conversation: &mut Conversation) -> Result<String, DomainError> {
        let system = self.system_instruction();
        let mut iterations = 0;

        loop {
            let response = self
                .model
                .complete(ModelRequest {
                    system: system.clone(),
                    messages: conversation.messages(),
                    tools: self.tools.specs(),
                })
                .await
                .map_err(|e| match e {
                    DomainError::ModelInvocation(_) => e,
                    other => DomainError::model(other.to_string()),
                })?;

            if response.tool_calls.is_empty() {
                let answer = response.content.clone();
                conversation.push(response.into_message());
                return Ok(answer);
            }

            // a response whose calls will never run is not recorded
            if iterations >= self.max_iterations {
                warn!(limit = self.max_iterations, "iteration limit reached");
                return Err(DomainError::IterationLimitExceeded {
                    limit: self.max_iterations,
                });
            }
            iterations += 1;

            let calls = response.tool_calls.clone();
            debug!(iteration = iterations, tool_count = calls.len(), "executing tool calls");
            conversation.push(response.into_message());

            let results = self.execute_tools(&calls).await;
            conversation.extend(results);
        }
    }

    /// Runs sibling calls concurrently; results come back in invocation order.
    async fn execute_tools(&self, calls: &[ToolInvocation]) -> Vec<Message> {
        join_all(calls.iter().map(|call| async move {
            match self.tools.execute(&call.name, call.arguments.clone()).await {
                Ok(output) => Message::tool_result(call, output),
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    Message::tool_error(call, e.to_payload())
                }
            }
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RagService;
    use crate::domain::ports::ModelResponse;
    use crate::domain::DocumentChunk;
    use crate::infrastructure::tools::{RegisteredTool, RetrievalTool};
    use crate::infrastructure::{InMemoryCheckpointStore, InMemoryVectorStore};
    use crate::testing::{FailingEmbedding, KeywordEmbedding, ScriptedModel};
    use async_trait::async_trait;
    use serde_json::json;

    async fn registry() -> Arc<ToolRegistry> {
        let rag = Arc::new(RagService::new(
            Arc::new(KeywordEmbedding::new(&["refund", "shipping"])),
            Arc::new(InMemoryVectorStore::new()),
        ));
        rag.index_chunks(&[
            DocumentChunk::new("Refunds are accepted within 30 days of purchase.", 0),
            DocumentChunk::new("Shipping takes five business days.", 1),
        ])
        .await
        .unwrap();

        Arc::new(
            ToolRegistry::new([RegisteredTool::Retrieval(RetrievalTool::with_defaults(rag))])
                .unwrap(),
        )
    }

    async fn agent(model: Arc<ScriptedModel>, store: Arc<dyn CheckpointStore>) -> ChatAgent {
        ChatAgent::new(model, registry().await, store, &AppConfig::default())
    }

    fn search(id: &str, query: &str) -> ToolInvocation {
        ToolInvocation::new(id, "search_documents", json!({ "query": query }))
    }

    /// Every tool message sits in the block right after the AI message that
    /// requested it.
    fn assert_tool_results_follow_calls(messages: &[Message]) {
        for (i, msg) in messages.iter().enumerate() {
            let Message::Tool { call_id, .. } = msg else {
                continue;
            };
            let owner = messages[..i]
                .iter()
                .rev()
                .find(|m| !matches!(m, Message::Tool { .. }))
                .expect("tool message without a preceding message");
            assert!(
                owner.tool_calls().iter().any(|c| &c.id == call_id),
                "tool result {call_id} does not follow its invocation"
            );
        }
    }

    async fn stored(store: &InMemoryCheckpointStore, thread: &str) -> Conversation {
        store.load(&ThreadId::new(thread)).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer_takes_one_step() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("Hello! How can I help?")]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await;

        let answer = agent.run(&ThreadId::new("t1"), "Hi").await.unwrap();

        assert_eq!(answer, "Hello! How can I help?");
        assert_eq!(model.requests().len(), 1);
        let conv = stored(&store, "t1").await;
        assert_eq!(
            conv.messages(),
            &[Message::human("Hi"), Message::ai("Hello! How can I help?", vec![])]
        );
    }

    #[tokio::test]
    async fn test_refund_question_uses_retrieval() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::tools(vec![search("c1", "refund policy")]),
            ModelResponse::text("FINAL ANSWER: Refunds are accepted within 30 days."),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await;

        let answer = agent
            .run(&ThreadId::new("t1"), "What is the refund policy?")
            .await
            .unwrap();

        assert!(answer.starts_with("FINAL ANSWER:"));
        assert!(answer.contains("30 days"));

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].system.contains("search_documents"));
        assert_eq!(requests[0].tool_names, vec!["search_documents"]);

        let tool_msg = requests[1].messages.last().unwrap();
        assert!(matches!(tool_msg, Message::Tool { is_error: false, .. }));
        assert!(tool_msg.content().contains("30 days"));

        let conv = stored(&store, "t1").await;
        assert_eq!(conv.len(), 4);
        assert_tool_results_follow_calls(conv.messages());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::tools(vec![ToolInvocation::new("c1", "send_email", json!({}))]),
            ModelResponse::text("Sorry, I cannot send email."),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await;

        let answer = agent.run(&ThreadId::new("t1"), "Email me").await.unwrap();

        assert_eq!(answer, "Sorry, I cannot send email.");
        assert_eq!(model.requests().len(), 2);

        let conv = stored(&store, "t1").await;
        match &conv.messages()[2] {
            Message::Tool {
                name,
                content,
                is_error,
                ..
            } => {
                assert_eq!(name, "send_email");
                assert!(is_error);
                assert!(content.contains("send_email"));
            }
            other => panic!("expected tool message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let model = Arc::new(ScriptedModel::always(ModelResponse::tools(vec![search(
            "c", "refund",
        )])));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await.with_max_iterations(3);

        let err = agent.run(&ThreadId::new("t1"), "loop").await.unwrap_err();

        assert!(matches!(err, DomainError::IterationLimitExceeded { limit: 3 }));
        assert_eq!(model.requests().len(), 4);

        let conv = stored(&store, "t1").await;
        let tool_phases = conv
            .messages()
            .iter()
            .filter(|m| !m.tool_calls().is_empty())
            .count();
        assert_eq!(tool_phases, 3);
        assert_eq!(conv.len(), 1 + 3 * 2);
        assert_tool_results_follow_calls(conv.messages());
    }

    #[tokio::test]
    async fn test_default_iteration_limit_is_fifteen() {
        let model = Arc::new(ScriptedModel::always(ModelResponse::tools(vec![search(
            "c", "refund",
        )])));
        let agent = agent(model.clone(), Arc::new(InMemoryCheckpointStore::new())).await;

        let err = agent.run(&ThreadId::new("t1"), "loop").await.unwrap_err();

        assert!(matches!(err, DomainError::IterationLimitExceeded { limit: 15 }));
        assert_eq!(model.requests().len(), 16);
    }

    #[tokio::test]
    async fn test_sibling_calls_keep_invocation_order() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::tools(vec![
                search("a", "shipping"),
                ToolInvocation::new("b", "missing_tool", json!({})),
                search("c", "refund"),
            ]),
            ModelResponse::text("done"),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model, store.clone()).await;

        agent.run(&ThreadId::new("t1"), "both").await.unwrap();

        let conv = stored(&store, "t1").await;
        let ids: Vec<&str> = conv.messages()[2..5]
            .iter()
            .map(|m| match m {
                Message::Tool { call_id, .. } => call_id.as_str(),
                other => panic!("expected tool message, got {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(conv.messages()[2].content().contains("Shipping"));
        assert!(conv.messages()[4].content().contains("30 days"));
        assert_tool_results_follow_calls(conv.messages());
    }

    #[tokio::test]
    async fn test_sequential_turns_append() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::tools(vec![search("c1", "refund")]),
            ModelResponse::text("FINAL ANSWER: 30 days."),
            ModelResponse::text("FINAL ANSWER: You're welcome."),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await;
        let thread = ThreadId::new("t1");

        agent.run(&thread, "Refund window?").await.unwrap();
        let first = stored(&store, "t1").await;

        agent.run(&thread, "Thanks").await.unwrap();
        let second = stored(&store, "t1").await;

        assert_eq!(&second.messages()[..first.len()], first.messages());
        assert_eq!(
            &second.messages()[first.len()..],
            &[
                Message::human("Thanks"),
                Message::ai("FINAL ANSWER: You're welcome.", vec![])
            ]
        );
        // the second turn saw the whole first turn
        assert_eq!(model.requests()[2].messages.len(), first.len() + 1);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_reported_to_model() {
        let rag = Arc::new(RagService::new(
            Arc::new(FailingEmbedding),
            Arc::new(InMemoryVectorStore::new()),
        ));
        let tools = Arc::new(
            ToolRegistry::new([RegisteredTool::Retrieval(RetrievalTool::with_defaults(rag))])
                .unwrap(),
        );
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::tools(vec![search("c1", "refund policy")]),
            ModelResponse::text("I could not reach the knowledge base."),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = ChatAgent::new(model.clone(), tools, store.clone(), &AppConfig::default());

        let answer = agent
            .run(&ThreadId::new("t1"), "What is the refund policy?")
            .await
            .unwrap();

        assert_eq!(answer, "I could not reach the knowledge base.");
        assert_eq!(model.requests().len(), 2);

        let conv = stored(&store, "t1").await;
        assert_eq!(conv.len(), 4);
        match &conv.messages()[2] {
            Message::Tool {
                call_id,
                content,
                is_error,
                ..
            } => {
                assert_eq!(call_id, "c1");
                assert!(is_error);
                assert!(content.contains("unavailable"));
            }
            other => panic!("expected tool message, got {other:?}"),
        }
        assert_tool_results_follow_calls(conv.messages());
    }

    #[tokio::test]
    async fn test_threads_are_independent() {
        let model = Arc::new(ScriptedModel::new([
            ModelResponse::text("one"),
            ModelResponse::text("two"),
        ]));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model.clone(), store.clone()).await;

        agent.run(&ThreadId::new("a"), "first").await.unwrap();
        agent.run(&ThreadId::new("b"), "second").await.unwrap();

        assert_eq!(stored(&store, "a").await.len(), 2);
        assert_eq!(stored(&store, "b").await.len(), 2);
        assert_eq!(model.requests()[1].messages, vec![Message::human("second")]);
    }

    #[tokio::test]
    async fn test_model_failure_propagates_and_checkpoints() {
        let model = Arc::new(ScriptedModel::new(Vec::new()).then_fail("quota exceeded"));
        let store = Arc::new(InMemoryCheckpointStore::new());
        let agent = agent(model, store.clone()).await;

        let err = agent.run(&ThreadId::new("t1"), "Hi").await.unwrap_err();

        assert!(matches!(err, DomainError::ModelInvocation(msg) if msg.contains("quota")));
        assert_eq!(stored(&store, "t1").await.messages(), &[Message::human("Hi")]);
    }

    struct BrokenStore;

    #[async_trait]
    impl CheckpointStore for BrokenStore {
        async fn load(&self, _thread_id: &ThreadId) -> Result<Option<Conversation>, DomainError> {
            Ok(None)
        }

        async fn save(&self, _conversation: &Conversation) -> Result<(), DomainError> {
            Err(DomainError::checkpoint("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_failed_save_is_not_success() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("answer")]));
        let agent = agent(model, Arc::new(BrokenStore)).await;

        let err = agent.run(&ThreadId::new("t1"), "Hi").await.unwrap_err();
        assert!(matches!(err, DomainError::CheckpointStore(_)));
    }

    #[tokio::test]
    async fn test_history() {
        let model = Arc::new(ScriptedModel::new([ModelResponse::text("hey")]));
        let agent = agent(model, Arc::new(InMemoryCheckpointStore::new())).await;
        let thread = ThreadId::new("t1");

        assert!(agent.history(&thread).await.unwrap().is_none());
        agent.run(&thread, "hi").await.unwrap();
        assert_eq!(agent.history(&thread).await.unwrap().unwrap().len(), 2);
    }
}
