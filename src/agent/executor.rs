//! Core conversation loop.

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, LlmError, OpenAiClient, ToolCall};
use crate::resources::ResourceStore;
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

/// Failures that abort a conversation turn.
///
/// Tool-level errors never appear here; they are folded into tool-result
/// turns so the model can react to them. Whatever history accumulated
/// before the failure is retained for the next turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Transport(#[from] LlmError),

    #[error("reached the tool-call round limit ({0}) without a final answer")]
    IterationLimitExceeded(usize),
}

/// The conversation executor.
///
/// Owns the message history for one interactive session. History is kept
/// in memory only and discarded when the process exits.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    store: ResourceStore,
    history: Vec<ChatMessage>,
}

impl Agent {
    /// Create a new agent with the given configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenAiClient::new(config.api_key.clone()));
        Self::with_client(config, llm)
    }

    /// Create an agent with an explicit model client (useful for testing).
    pub fn with_client(config: Config, llm: Arc<dyn LlmClient>) -> anyhow::Result<Self> {
        let tools = ToolRegistry::new();
        let store = ResourceStore::new(&config.output_dir)?;
        let history = vec![ChatMessage::system(build_system_prompt(&tools))];

        Ok(Self {
            config,
            llm,
            tools,
            store,
            history,
        })
    }

    /// The conversation history so far, including the system prompt.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Access to the artifact store, for housekeeping at the CLI level.
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Process one user message and return the model's final reply.
    ///
    /// Runs up to `max_iterations` model rounds. Each round either ends the
    /// turn with a plain-text reply or requests tool calls, which are
    /// dispatched sequentially in the order the model emitted them. The
    /// round after the cap fails with [`AgentError::IterationLimitExceeded`].
    pub async fn run_turn(&mut self, user_message: &str) -> Result<String, AgentError> {
        self.history.push(ChatMessage::user(user_message));

        let tool_schemas = self.tools.descriptors();

        for round in 1..=self.config.max_iterations {
            tracing::debug!(round, max = self.config.max_iterations, "Model round");

            let response = self
                .llm
                .chat_completion(&self.config.model, &self.history, Some(&tool_schemas))
                .await?;

            if let Some(tool_calls) = response.tool_calls {
                if !tool_calls.is_empty() {
                    self.history.push(ChatMessage::assistant_tool_calls(
                        response.content,
                        tool_calls.clone(),
                    ));

                    for call in &tool_calls {
                        let result = self.dispatch(call).await;
                        tracing::debug!(
                            tool = %call.function.name,
                            "Tool result: {}",
                            truncate_for_log(&result, 500)
                        );
                        self.history
                            .push(ChatMessage::tool_result(call.id.clone(), result));
                    }

                    continue;
                }
            }

            // No tool calls - this is the final response.
            let content = response.content.unwrap_or_default();
            if content.is_empty() {
                return Err(LlmError::MalformedResponse(
                    "completion had neither content nor tool calls".to_string(),
                )
                .into());
            }
            self.history.push(ChatMessage::assistant(content.clone()));
            return Ok(content);
        }

        tracing::warn!(
            max = self.config.max_iterations,
            "Tool-call round limit reached without a final answer"
        );
        Err(AgentError::IterationLimitExceeded(self.config.max_iterations))
    }

    /// Dispatch a single tool call, folding every failure into the result
    /// text so the model can see it and recover.
    async fn dispatch(&self, call: &ToolCall) -> String {
        let args: serde_json::Value = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error: arguments were not valid JSON: {}", e),
        };

        match self
            .tools
            .invoke(&call.function.name, args, &self.store)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = %call.function.name, "Tool call failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, FunctionCall, Role, ToolDefinition};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Model client that replays a scripted sequence of responses.
    struct ScriptedClient {
        responses: Mutex<VecDeque<ChatResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<ChatResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls_made(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ChatResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::MalformedResponse("script exhausted".to_string()))
        }
    }

    /// Model client that always fails at the transport level.
    struct UnreachableClient;

    #[async_trait]
    impl LlmClient for UnreachableClient {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ChatResponse, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            })
        }
    }

    fn text(content: &str) -> ChatResponse {
        ChatResponse {
            content: Some(content.to_string()),
            tool_calls: None,
        }
    }

    fn tool_call_response(id: &str, name: &str, arguments: &str) -> ChatResponse {
        ChatResponse {
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
        }
    }

    fn agent_with(client: Arc<dyn LlmClient>, dir: &tempfile::TempDir) -> Agent {
        let config = Config::new(
            "test-key".to_string(),
            "test-model".to_string(),
            dir.path().to_path_buf(),
        );
        Agent::with_client(config, client).unwrap()
    }

    #[tokio::test]
    async fn plain_text_reply_completes_in_one_round() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![text("Hello there!")]));
        let mut agent = agent_with(client.clone(), &dir);

        let reply = agent.run_turn("hi").await.unwrap();

        assert_eq!(reply, "Hello there!");
        assert_eq!(client.calls_made(), 1);
        // system prompt + user + assistant, nothing else
        assert_eq!(agent.history().len(), 3);
        assert_eq!(agent.history()[1].role, Role::User);
        assert_eq!(agent.history()[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn tool_call_result_is_fed_back_to_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("call_1", "calculate_average", r#"{"numbers": [2, 4, 6]}"#),
            text("The average is 4."),
        ]));
        let mut agent = agent_with(client.clone(), &dir);

        let reply = agent.run_turn("average 2 4 6").await.unwrap();

        assert_eq!(reply, "The average is 4.");
        assert_eq!(client.calls_made(), 2);

        let tool_turn = agent
            .history()
            .iter()
            .find(|m| m.role == Role::Tool)
            .expect("tool result turn missing");
        assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_turn.content.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn failing_tool_call_is_recorded_and_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("call_1", "no_such_tool", "{}"),
            text("That function does not exist, sorry."),
        ]));
        let mut agent = agent_with(client.clone(), &dir);

        let reply = agent.run_turn("do the thing").await.unwrap();

        assert_eq!(reply, "That function does not exist, sorry.");
        let tool_turn = agent
            .history()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_turn.content.as_deref().unwrap().starts_with("Error:"));
    }

    #[tokio::test]
    async fn malformed_arguments_become_a_tool_result_turn() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call_response("call_1", "fibonacci", "not json"),
            text("Let me try that again."),
        ]));
        let mut agent = agent_with(client, &dir);

        agent.run_turn("fib").await.unwrap();

        let tool_turn = agent
            .history()
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(tool_turn
            .content
            .as_deref()
            .unwrap()
            .contains("not valid JSON"));
    }

    #[tokio::test]
    async fn iteration_limit_fails_on_exactly_the_round_after_the_cap() {
        let dir = tempfile::tempdir().unwrap();
        // Script one tool-call response per allowed round; the 6th round
        // must fail before consuming another response.
        let responses: Vec<ChatResponse> = (0..6)
            .map(|i| tool_call_response(&format!("call_{i}"), "fibonacci", r#"{"n": 3}"#))
            .collect();
        let client = Arc::new(ScriptedClient::new(responses));
        let mut agent = agent_with(client.clone(), &dir);

        let err = agent.run_turn("loop forever").await.unwrap_err();

        assert!(matches!(err, AgentError::IterationLimitExceeded(5)));
        assert_eq!(client.calls_made(), 5, "limit must stop the 6th model call");
        // Partial history survives: user turn plus 5 assistant/tool pairs.
        assert!(agent.history().iter().any(|m| m.role == Role::Tool));
    }

    #[tokio::test]
    async fn transport_error_aborts_but_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = agent_with(Arc::new(UnreachableClient), &dir);

        let err = agent.run_turn("hello?").await.unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
        // The user message stays in history for the next attempt.
        assert_eq!(agent.history().last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn empty_completion_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![ChatResponse::default()]));
        let mut agent = agent_with(client, &dir);

        let err = agent.run_turn("hi").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Transport(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn history_accumulates_across_turns() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(ScriptedClient::new(vec![text("one"), text("two")]));
        let mut agent = agent_with(client, &dir);

        agent.run_turn("first").await.unwrap();
        let after_first = agent.history().len();
        agent.run_turn("second").await.unwrap();

        assert_eq!(agent.history().len(), after_first + 2);
    }

    #[test]
    fn truncate_for_log_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        let truncated = truncate_for_log("héllo wörld", 6);
        assert!(truncated.ends_with("[truncated]"));
    }
}
