//! Turn-level tests driving the full dispatch stack with a scripted model.
//!
//! These run real filesystem and process operations inside a temporary
//! working root; only the model service is scripted.

use serde_json::json;

use sandbox_agent::core::conversation::{ConversationState, Turn};
use sandbox_agent::io::model::ModelResponse;
use sandbox_agent::test_support::{ScriptedModel, TestSandbox, op};
use sandbox_agent::turn::{TurnStop, run_turn};

/// Write a script, run it, inspect the tree, then answer.
///
/// The script only exists because of the write earlier in the same step, so
/// this also checks that dispatch is sequential.
#[cfg(unix)]
#[test]
fn write_then_run_in_one_step() {
    use sandbox_agent::io::sandbox::OperationLimits;

    let sandbox = TestSandbox::with_limits(OperationLimits {
        interpreter: "sh".to_string(),
        script_extension: "sh".to_string(),
        ..OperationLimits::default()
    });
    let model = ScriptedModel::new(vec![
        ModelResponse::requests(vec![
            op(
                "write_file",
                json!({"file_path": "scripts/hello.sh", "content": "echo hello\n"}),
            ),
            op("run_python_file", json!({"file_path": "scripts/hello.sh"})),
        ]),
        ModelResponse::requests(vec![op("get_files_info", json!({"directory": "scripts"}))]),
        ModelResponse::text("The script prints hello."),
    ]);
    let mut conversation = ConversationState::new();
    conversation.push_user("write and run a hello script");

    let outcome = run_turn(&model, &mut conversation, sandbox.sandbox(), 20, |_| {})
        .expect("turn");

    assert_eq!(
        outcome.stop,
        TurnStop::Complete {
            text: "The script prints hello.".to_string()
        }
    );
    assert_eq!(outcome.operations_executed, 3);
    assert_eq!(outcome.model_calls, 3);

    let results: Vec<(&str, &str)> = conversation.tool_results().collect();
    assert_eq!(
        results,
        vec![
            (
                "write_file",
                "Successfully wrote to \"scripts/hello.sh\" (11 bytes written)"
            ),
            ("run_python_file", "STDOUT: hello\nNo STDERR from script"),
            (
                "get_files_info",
                "- hello.sh: file_size=11 bytes, is_dir=false"
            ),
        ]
    );
}

/// A model that never stops asking is cut off by the budget, and the next
/// user turn starts with a fresh budget on the preserved conversation.
#[test]
fn runaway_model_is_bounded_and_conversation_preserved() {
    let sandbox = TestSandbox::new();
    sandbox.write("main.py", "print('x')\n");
    let mut steps: Vec<ModelResponse> = (0..4)
        .map(|_| {
            ModelResponse::requests(vec![op(
                "get_file_content",
                json!({"file_path": "main.py"}),
            )])
        })
        .collect();
    steps.push(ModelResponse::text("ready to continue"));
    let model = ScriptedModel::new(steps);

    let mut conversation = ConversationState::new();
    conversation.push_user("read it forever");
    let first =
        run_turn(&model, &mut conversation, sandbox.sandbox(), 4, |_| {}).expect("turn 1");
    assert_eq!(first.stop, TurnStop::BudgetExhausted { used: 4, max: 4 });
    assert_eq!(conversation.tool_results().count(), 4);
    let len_after_first = conversation.len();

    conversation.push_user("go on");
    let second =
        run_turn(&model, &mut conversation, sandbox.sandbox(), 4, |_| {}).expect("turn 2");
    assert_eq!(
        second.stop,
        TurnStop::Complete {
            text: "ready to continue".to_string()
        }
    );
    assert_eq!(second.operations_executed, 0);
    assert_eq!(conversation.len(), len_after_first + 2);
    assert!(matches!(
        conversation.turns().last(),
        Some(Turn::Model { text: Some(text), .. }) if text == "ready to continue"
    ));
}

/// Failures of every kind come back as text the model can read; none of them
/// abort the turn.
#[test]
fn failures_are_reported_as_results() {
    let sandbox = TestSandbox::new();
    sandbox.write("notes.txt", "plain text");
    let model = ScriptedModel::new(vec![
        ModelResponse::requests(vec![
            op("get_file_content", json!({"file_path": "../../etc/shadow"})),
            op("get_file_content", json!({"file_path": "missing.py"})),
            op("run_python_file", json!({"file_path": "notes.txt"})),
            op("write_file", json!({"file_path": "x.txt"})),
            op("launch_rockets", json!({})),
        ]),
        ModelResponse::text("I hit some errors."),
    ]);
    let mut conversation = ConversationState::new();

    let outcome = run_turn(&model, &mut conversation, sandbox.sandbox(), 20, |_| {})
        .expect("turn");
    assert!(matches!(outcome.stop, TurnStop::Complete { .. }));

    let texts: Vec<&str> = conversation.tool_results().map(|(_, text)| text).collect();
    assert_eq!(texts.len(), 5);
    assert_eq!(
        texts[0],
        "Error: Cannot read \"../../etc/shadow\" as it is outside the permitted working directory"
    );
    assert_eq!(
        texts[1],
        "Error: File not found or is not a regular file: \"missing.py\""
    );
    assert_eq!(texts[2], "Error: File \"notes.txt\" is not a .py script");
    assert!(
        texts[3].starts_with("Error: Invalid arguments for write_file"),
        "{}",
        texts[3]
    );
    assert_eq!(texts[4], "Error: Unknown function: launch_rockets");
    assert!(!sandbox.root().join("x.txt").exists());
}
