//! Orchestrator — runs one user turn to a final answer.
//!
//! Each turn is staged on top of the transcript: the user message, every
//! tool-call-bearing assistant message, their tool results, and the final
//! answer are committed together. A turn that fails anywhere is dropped
//! whole, so the transcript never holds a tool call without its result.

use std::sync::Arc;

use tracing::{debug, info};

use super::prompts::build_system_prompt;
use super::state::Step;
use crate::llm::client::LlmError;
use crate::llm::ChatModel;
use crate::tools::{ToolDispatcher, ToolError};
use crate::transcript::{Message, Transcript, TranscriptError};

/// Default bound on model → tools → model rounds within one user turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Errors that abort the current user turn.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("unimplemented finish reason: {0}")]
    UnrecognizedFinishReason(String),

    #[error("model requested tool calls but sent none")]
    EmptyToolCalls,

    #[error("gave up after {0} tool rounds without a final answer")]
    ToolRoundLimit(usize),

    #[error("transcript invariant violated: {0}")]
    Transcript(#[from] TranscriptError),
}

impl AgentError {
    /// Capability gaps (unknown tool, unknown finish reason), as opposed to
    /// transient or input errors.
    pub fn is_unimplemented(&self) -> bool {
        match self {
            AgentError::UnrecognizedFinishReason(_) => true,
            AgentError::Tool(e) => e.is_unimplemented(),
            _ => false,
        }
    }
}

/// Owns the conversation and drives the model/tool loop.
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    dispatcher: ToolDispatcher,
    transcript: Transcript,
    max_tool_rounds: usize,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn ChatModel>, dispatcher: ToolDispatcher, system_prompt: &str) -> Self {
        let tool_names: Vec<String> = dispatcher
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        Self {
            model,
            dispatcher,
            transcript: Transcript::new(build_system_prompt(system_prompt, &tool_names)),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run one user turn. Returns `Ok(None)` for blank input (nothing is
    /// recorded), otherwise the final answer, which is already committed to
    /// the transcript.
    pub async fn run_turn(&mut self, input: &str) -> Result<Option<String>, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let tools = self.dispatcher.definitions();
        let mut turn = self.transcript.begin_turn();
        turn.push(Message::user(input))?;

        let mut rounds = 0;
        loop {
            let completion = self.model.complete(turn.messages(), &tools).await?;

            match Step::from(completion) {
                Step::Terminal(answer) => {
                    turn.push(Message::assistant(answer.clone()))?;
                    turn.commit()?;
                    debug!(rounds, "turn complete");
                    return Ok(Some(answer));
                }
                Step::NeedsTool { content, calls } => {
                    if calls.is_empty() {
                        return Err(AgentError::EmptyToolCalls);
                    }
                    rounds += 1;
                    if rounds > self.max_tool_rounds {
                        return Err(AgentError::ToolRoundLimit(self.max_tool_rounds));
                    }
                    info!(round = rounds, calls = calls.len(), "model requested tools");

                    let results = self.dispatcher.dispatch_all(&calls).await?;
                    turn.push(Message::assistant_tool_calls(content, calls))?;
                    for result in results {
                        turn.push(result)?;
                    }
                }
                Step::Unrecognized(reason) => {
                    return Err(AgentError::UnrecognizedFinishReason(reason));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::llm::types::{Completion, FinishReason, ToolCallRequest};
    use crate::retrieval::process::ProcessLookup;
    use crate::retrieval::query::QueryExtractor;
    use crate::retrieval::{DocumentContext, RetrievalBridge, Retriever};
    use crate::testing::ScriptedModel;
    use crate::tools::documentation::{DocumentationTool, GET_DOCUMENTATION_CONTEXT};
    use crate::transcript::Role;

    struct CannedRetriever(&'static str);

    #[async_trait::async_trait]
    impl Retriever for CannedRetriever {
        async fn resolve(&self, _user_input: &str) -> DocumentContext {
            DocumentContext::new(self.0)
        }
    }

    fn doc_call(id: &str, input: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            function_name: GET_DOCUMENTATION_CONTEXT.into(),
            arguments: serde_json::json!({ "userInput": input }).to_string(),
        }
    }

    fn orchestrator(
        script: Vec<Result<Completion, LlmError>>,
        context: &'static str,
    ) -> (Arc<ScriptedModel>, Orchestrator) {
        let model = Arc::new(ScriptedModel::new(script));
        let dispatcher = ToolDispatcher::new().register(Arc::new(DocumentationTool::new(
            Arc::new(CannedRetriever(context)),
        )));
        let orch = Orchestrator::new(model.clone(), dispatcher, "sys");
        (model, orch)
    }

    #[tokio::test]
    async fn blank_input_is_skipped() {
        let (model, mut orch) = orchestrator(vec![], "");
        for input in ["", "   ", "\t\n"] {
            assert_eq!(orch.run_turn(input).await.unwrap(), None);
        }
        assert_eq!(orch.transcript().len(), 1);
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn direct_answer_is_committed() {
        let (model, mut orch) = orchestrator(vec![Ok(Completion::stop("hello"))], "");
        let answer = orch.run_turn("hi").await.unwrap();
        assert_eq!(answer.as_deref(), Some("hello"));

        let snap = orch.transcript().snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].role, Role::System);
        assert_eq!(snap[1], Message::user("hi"));
        assert_eq!(snap[2], Message::assistant("hello"));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_names, vec![GET_DOCUMENTATION_CONTEXT]);
    }

    #[tokio::test]
    async fn every_tool_call_gets_a_result_before_next_request() {
        let (model, mut orch) = orchestrator(
            vec![
                Ok(Completion::tool_calls(vec![
                    doc_call("c1", "a"),
                    doc_call("c2", "b"),
                ])),
                Ok(Completion::tool_calls(vec![doc_call("c3", "c")])),
                Ok(Completion::stop("final")),
            ],
            "ctx",
        );
        orch.run_turn("question").await.unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 3);

        // Second request: ..., user, assistant(c1,c2), tool c1, tool c2
        let second = &requests[1].messages;
        let tail: Vec<(Role, Option<&str>)> = second[second.len() - 3..]
            .iter()
            .map(|m| (m.role, m.tool_call_id.as_deref()))
            .collect();
        assert_eq!(
            tail,
            vec![
                (Role::Assistant, None),
                (Role::Tool, Some("c1")),
                (Role::Tool, Some("c2"))
            ]
        );

        let third = &requests[2].messages;
        assert_eq!(third.last().unwrap().tool_call_id.as_deref(), Some("c3"));
        assert_eq!(third.last().unwrap().content, "ctx");

        // system, user, asst(2 calls), tool, tool, asst(1 call), tool, final
        assert_eq!(orch.transcript().len(), 8);
    }

    #[tokio::test]
    async fn unknown_tool_aborts_turn_without_touching_transcript() {
        let bad = ToolCallRequest {
            id: "c1".into(),
            function_name: "Unknown".into(),
            arguments: "{}".into(),
        };
        let (model, mut orch) = orchestrator(vec![Ok(Completion::tool_calls(vec![bad]))], "");
        let err = orch.run_turn("question").await.unwrap_err();
        assert!(err.is_unimplemented());
        assert!(matches!(err, AgentError::Tool(ToolError::UnknownFunction(_))));
        assert_eq!(orch.transcript().len(), 1);
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_argument_aborts_turn() {
        let bad = ToolCallRequest {
            id: "c1".into(),
            function_name: GET_DOCUMENTATION_CONTEXT.into(),
            arguments: "{}".into(),
        };
        let (_, mut orch) = orchestrator(vec![Ok(Completion::tool_calls(vec![bad]))], "");
        let err = orch.run_turn("question").await.unwrap_err();
        assert!(matches!(err, AgentError::Tool(ToolError::InvalidArguments { .. })));
        assert!(!err.is_unimplemented());
        assert_eq!(orch.transcript().len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_finish_reason_aborts_turn() {
        let mut truncated = Completion::stop("half an ans");
        truncated.finish_reason = FinishReason::Unrecognized("length".into());
        let (_, mut orch) = orchestrator(vec![Ok(truncated)], "");
        let err = orch.run_turn("question").await.unwrap_err();
        assert!(err.is_unimplemented());
        assert!(err.to_string().contains("length"));
        assert_eq!(orch.transcript().len(), 1);
    }

    #[tokio::test]
    async fn tool_calls_without_calls_is_an_error() {
        let (_, mut orch) = orchestrator(vec![Ok(Completion::tool_calls(vec![]))], "");
        let err = orch.run_turn("question").await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyToolCalls));
    }

    #[tokio::test]
    async fn tool_rounds_are_capped() {
        let script = (0..5)
            .map(|i| Ok(Completion::tool_calls(vec![doc_call(&format!("c{i}"), "x")])))
            .collect();
        let (model, orch) = orchestrator(script, "");
        let mut orch = orch.with_max_tool_rounds(2);
        let err = orch.run_turn("question").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolRoundLimit(2)));
        assert_eq!(model.requests().len(), 3);
        assert_eq!(orch.transcript().len(), 1);
    }

    #[tokio::test]
    async fn llm_failure_aborts_turn_and_session_continues() {
        let (_, mut orch) = orchestrator(
            vec![
                Err(LlmError::ApiError {
                    status: 500,
                    message: "oops".into(),
                }),
                Ok(Completion::stop("recovered")),
            ],
            "",
        );
        assert!(matches!(
            orch.run_turn("first").await.unwrap_err(),
            AgentError::Llm(_)
        ));
        assert_eq!(orch.transcript().len(), 1);
        assert_eq!(
            orch.run_turn("second").await.unwrap().as_deref(),
            Some("recovered")
        );
        assert_eq!(orch.transcript().len(), 3);
    }

    #[tokio::test]
    async fn empty_retrieval_still_yields_tool_message() {
        let (model, mut orch) = orchestrator(
            vec![
                Ok(Completion::tool_calls(vec![doc_call("c1", "q")])),
                Ok(Completion::stop("no docs found")),
            ],
            "",
        );
        orch.run_turn("q").await.unwrap();
        let second = &model.requests()[1].messages;
        let tool = second.last().unwrap();
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.content, "");
    }

    #[tokio::test]
    async fn history_is_carried_across_turns() {
        let (model, mut orch) = orchestrator(
            vec![Ok(Completion::stop("one")), Ok(Completion::stop("two"))],
            "",
        );
        orch.run_turn("first").await.unwrap();
        orch.run_turn("second").await.unwrap();

        let second = &model.requests()[1].messages;
        let contents: Vec<&str> = second[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "one", "second"]);
    }

    #[tokio::test]
    async fn end_to_end_patient_benefits() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/benefits.md"), "Benefits endpoint").unwrap();
        std::fs::write(dir.path().join("docs/patients.md"), "Patients endpoint").unwrap();

        // Retrieval process echoes its paths only for the expected query.
        let script = r#"[ "$1" = "get patient benefits" ] && printf 'docs/benefits.md\ndocs/patients.md\n'"#;
        let lookup = ProcessLookup::new(
            "sh",
            vec!["-c".into(), script.into(), "retriever".into()],
            Duration::from_secs(5),
        )
        .with_working_dir(Some(dir.path().to_path_buf()));

        let model = Arc::new(ScriptedModel::new(vec![
            Ok(Completion::tool_calls(vec![doc_call(
                "call_1",
                "How do I get patient benefits?",
            )])),
            Ok(Completion::stop("get patient benefits")),
            Ok(Completion::stop("Use the ```GET /benefits``` endpoint.")),
        ]));
        let bridge = RetrievalBridge::new(QueryExtractor::new(model.clone()), Arc::new(lookup))
            .with_documents_root(Some(dir.path().to_path_buf()));
        let dispatcher =
            ToolDispatcher::new().register(Arc::new(DocumentationTool::new(Arc::new(bridge))));
        let mut orch = Orchestrator::new(model.clone(), dispatcher, "sys");

        let answer = orch
            .run_turn("How do I get patient benefits?")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(answer, "Use the ```GET /benefits``` endpoint.");

        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        // The extraction exchange is standalone.
        assert_eq!(requests[1].messages.len(), 2);
        assert!(requests[1].tool_names.is_empty());

        let snap = orch.transcript().snapshot();
        let tool = &snap[3];
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool.content, "Benefits endpoint\nPatients endpoint");
        assert_eq!(snap.last().unwrap(), &Message::assistant(answer));
    }
}
