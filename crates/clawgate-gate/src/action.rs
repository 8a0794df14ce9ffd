//! Description of one agent action as the gate sees it.

use serde::{Deserialize, Serialize};

use clawgate_access::FileOperation;
use clawgate_core::{Details, OperationType};

/// One action submitted to [`SecurityGate::evaluate`].
///
/// Every check is opt-in: a field left empty skips the matching stage.
/// `operation_name` and `args` always go to risk assessment.
///
/// [`SecurityGate::evaluate`]: crate::SecurityGate::evaluate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedAction {
    /// Operation name for risk assessment (`exec`, `message_send`, ...).
    pub operation_name: String,
    /// Raw action arguments.
    #[serde(default)]
    pub args: Details,
    /// Category and details to record for toxic flow detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<(OperationType, Details)>,
    /// Path and kind of file access to check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<(String, FileOperation)>,
    /// Tool name to check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// Gateway RPC method to check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_method: Option<String>,
}

impl GatedAction {
    /// An action with only risk assessment configured.
    #[must_use]
    pub fn new(operation_name: impl Into<String>, args: Details) -> Self {
        Self {
            operation_name: operation_name.into(),
            args,
            ..Self::default()
        }
    }

    /// A tool call: the tool check and risk assessment both use `tool`.
    #[must_use]
    pub fn tool_call(tool: impl Into<String>, args: Details) -> Self {
        let tool = tool.into();
        Self {
            operation_name: tool.clone(),
            args,
            tool: Some(tool),
            ..Self::default()
        }
    }

    /// Check file access to `path`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, op: FileOperation) -> Self {
        self.file = Some((path.into(), op));
        self
    }

    /// Check tool access.
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Check gateway method access.
    #[must_use]
    pub fn with_gateway_method(mut self, method: impl Into<String>) -> Self {
        self.gateway_method = Some(method.into());
        self
    }

    /// Record the action for toxic flow detection.
    #[must_use]
    pub fn with_flow(mut self, op_type: OperationType, details: Details) -> Self {
        self.flow = Some((op_type, details));
        self
    }

    /// Record the action for toxic flow detection, reusing `args` as details.
    #[must_use]
    pub fn tracked_as(self, op_type: OperationType) -> Self {
        let details = self.args.clone();
        self.with_flow(op_type, details)
    }
}
