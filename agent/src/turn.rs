//! Turn loop: drives one user turn to completion.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::budget::TurnBudget;
use crate::core::conversation::{ConversationState, OperationRequest};
use crate::core::operation::declarations;
use crate::dispatch::{DispatchOutcome, dispatch};
use crate::io::model::{Model, ModelRequest, Usage};
use crate::io::sandbox::Sandbox;

/// Reason why `run_turn` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStop {
    /// The model answered without requesting any operation.
    Complete { text: String },
    /// The tool-call budget ran out. Conversation state is kept as is.
    BudgetExhausted { used: u32, max: u32 },
}

/// Summary of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub model_calls: u32,
    pub operations_executed: u32,
    pub usage: Usage,
    pub stop: TurnStop,
}

/// Progress notifications for the session surface.
#[derive(Debug, Clone, Copy)]
pub enum TurnEvent<'a> {
    OperationStarted {
        request: &'a OperationRequest,
    },
    OperationFinished {
        request: &'a OperationRequest,
        outcome: &'a DispatchOutcome,
    },
}

/// Ask the model for steps until it stops requesting operations or the
/// `max_tool_calls` budget is used up.
///
/// Every operation requested in a step is executed in order, even when that
/// step overshoots the budget, so each request gets a matching result. The
/// budget only gates further model calls. Model errors are returned as-is and
/// leave everything appended so far in `conversation`.
#[instrument(skip_all, fields(max_tool_calls = max_tool_calls, turns = conversation.len()))]
pub fn run_turn<M: Model, F: FnMut(TurnEvent<'_>)>(
    model: &M,
    conversation: &mut ConversationState,
    sandbox: &Sandbox,
    max_tool_calls: u32,
    mut on_event: F,
) -> Result<TurnOutcome> {
    let operations = declarations();
    let mut budget = TurnBudget::new(max_tool_calls);
    let mut model_calls = 0u32;
    let mut usage = Usage::default();

    while !budget.is_exhausted() {
        let response = model
            .generate(&ModelRequest {
                conversation: &*conversation,
                operations: &operations,
            })
            .context("model request failed")?;
        model_calls += 1;
        usage.add(response.usage);

        let requests = response.requests;
        let text = response.text;
        conversation.push_model(text.clone(), requests.clone());

        if requests.is_empty() {
            info!(model_calls, operations = budget.used(), "turn complete");
            return Ok(TurnOutcome {
                model_calls,
                operations_executed: budget.used(),
                usage,
                stop: TurnStop::Complete {
                    text: text.unwrap_or_default(),
                },
            });
        }

        debug!(count = requests.len(), "model requested operations");
        for request in &requests {
            on_event(TurnEvent::OperationStarted { request });
            let outcome = dispatch(sandbox, request);
            budget.consume();
            conversation.push_tool(outcome.name.clone(), outcome.text(), outcome.handled());
            on_event(TurnEvent::OperationFinished {
                request,
                outcome: &outcome,
            });
        }
    }

    warn!(
        used = budget.used(),
        max = budget.max(),
        "tool-call budget exhausted"
    );
    Ok(TurnOutcome {
        model_calls,
        operations_executed: budget.used(),
        usage,
        stop: TurnStop::BudgetExhausted {
            used: budget.used(),
            max: budget.max(),
        },
    })
}
