//! Test-only helpers: temporary sandboxes and scripted models.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};

use crate::core::conversation::{OperationRequest, Turn};
use crate::io::model::{Model, ModelRequest, ModelResponse};
use crate::io::sandbox::{OperationLimits, Sandbox, WorkingRoot};

/// A sandbox rooted in a fresh temporary directory.
pub struct TestSandbox {
    _temp: tempfile::TempDir,
    sandbox: Sandbox,
}

impl TestSandbox {
    pub fn new() -> Self {
        Self::with_limits(OperationLimits::default())
    }

    pub fn with_limits(limits: OperationLimits) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = WorkingRoot::new(temp.path()).expect("working root");
        Self {
            _temp: temp,
            sandbox: Sandbox::new(root, limits),
        }
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root.path()
    }

    /// Write `contents` to a root-relative path, creating parents.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write fixture");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("read fixture")
    }
}

impl Default for TestSandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Model that replays queued responses and records what it was shown.
pub struct ScriptedModel {
    responses: RefCell<VecDeque<ModelResponse>>,
    seen: RefCell<Vec<Vec<Turn>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }

    /// Conversation snapshots, one per call.
    pub fn seen(&self) -> Vec<Vec<Turn>> {
        self.seen.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Model for ScriptedModel {
    fn generate(&self, request: &ModelRequest<'_>) -> Result<ModelResponse> {
        self.seen
            .borrow_mut()
            .push(request.conversation.turns().to_vec());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted model has no responses left"))
    }
}

/// Build an operation request from a JSON object literal.
pub fn op(name: &str, args: Value) -> OperationRequest {
    let arguments = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    OperationRequest::new(name, arguments)
}
