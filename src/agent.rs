//! The turn-taking loop between the model and the file tools.
//!
//! [`Conversation::submit`] appends the user's message, then alternates
//! model invocations and tool dispatch until the model answers without
//! requesting any tool, or the per-exchange iteration budget runs out.
//! Every state change is an append to the owned [`Transcript`].

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::{ModelInvocationError, ToolError};
use crate::extract::{extract, ModelReply};
use crate::message::{Message, Transcript};
use crate::output::Renderer;
use crate::tools::{ToolDefinition, ToolRegistry, ToolResult};

/// Reason recorded on calls left unanswered by an interrupted exchange.
const INTERRUPTED_REASON: &str = "the previous exchange was interrupted before this call ran";

/// A completion service that can continue a transcript.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Requests the next assistant reply for `transcript`.
    ///
    /// `tools` is the catalogue the model may call; backends without native
    /// function calling describe it in the prompt instead.
    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ModelInvocationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// The model produced a reply with no tool calls.
    Completed,
    /// The iteration budget ran out while the model still wanted tools.
    BudgetExhausted,
}

/// Outcome of one user submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Most recent non-empty assistant text of the exchange. When the final
    /// turn is empty or only requests tools, this is text from an earlier
    /// turn; it is empty if the model never wrote any.
    pub reply: String,
    pub status: ExchangeStatus,
    /// Number of model invocations performed.
    pub model_turns: usize,
    /// Number of tool calls actually executed.
    pub tool_calls: usize,
}

/// One conversation: a backend, the tools it may call and the history so far.
pub struct Conversation<B> {
    backend: B,
    tools: ToolRegistry,
    transcript: Transcript,
    max_iterations: usize,
}

impl<B: ModelBackend> Conversation<B> {
    /// `max_iterations` caps model invocations per exchange; values below 1
    /// are raised to 1.
    pub fn new(
        backend: B,
        tools: ToolRegistry,
        transcript: Transcript,
        max_iterations: usize,
    ) -> Self {
        Self {
            backend,
            tools,
            transcript,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Runs one exchange for `user_text`.
    ///
    /// Tool failures are fed back to the model as error results and never
    /// end the exchange. Running out of iterations is reported through
    /// [`ExchangeStatus::BudgetExhausted`].
    ///
    /// # Errors
    ///
    /// Returns the [`ModelInvocationError`] of a failed model call. Everything
    /// appended before the failure, including the user message, is kept.
    pub async fn submit(
        &mut self,
        user_text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Exchange, ModelInvocationError> {
        let closed = self.transcript.close_pending_calls(INTERRUPTED_REASON);
        if closed > 0 {
            debug!(closed, "closed tool calls left by an interrupted exchange");
            renderer.notice(&format!(
                "{closed} tool call(s) from the interrupted exchange were not run"
            ));
        }

        self.transcript.append(Message::user(user_text));
        let definitions = self.tools.definitions();
        let mut exchange = Exchange {
            reply: String::new(),
            status: ExchangeStatus::Completed,
            model_turns: 0,
            tool_calls: 0,
        };

        loop {
            exchange.model_turns += 1;
            debug!(
                turn = exchange.model_turns,
                messages = self.transcript.len(),
                "invoking model"
            );
            let reply = self
                .backend
                .complete(&self.transcript, &definitions)
                .await
                .inspect_err(|err| error!("model invocation failed: {err}"))?;

            let turn = extract(reply);
            if !turn.text.is_empty() {
                renderer.assistant_text(&turn.text);
                exchange.reply = turn.text.clone();
            }
            let calls = turn.calls.clone();
            self.transcript.append(turn.into_message());

            if calls.is_empty() {
                return Ok(exchange);
            }

            if exchange.model_turns >= self.max_iterations {
                warn!(
                    budget = self.max_iterations,
                    unanswered = calls.len(),
                    "iteration budget exhausted"
                );
                let err = ToolError::IterationBudgetExhausted(self.max_iterations);
                for call in &calls {
                    let result = ToolResult::error(call.id.clone(), &err);
                    renderer.tool_result(&result);
                    self.transcript.append(result.to_message());
                }
                renderer.notice(&format!(
                    "stopped after {} model turns; the last tool request was not run",
                    self.max_iterations
                ));
                exchange.status = ExchangeStatus::BudgetExhausted;
                return Ok(exchange);
            }

            for call in &calls {
                renderer.tool_call(call);
            }
            let results = self.tools.dispatch_batch(&calls).await;
            exchange.tool_calls += results.len();
            for result in &results {
                renderer.tool_result(result);
                self.transcript.append(result.to_message());
            }
        }
    }
}
