//! Response normalization
//!
//! Turns the raw text returned by a provider into one of the three result
//! shapes the application understands. Plan and structure tasks are decoded
//! as JSON; code tasks are passed through untouched.
//!
//! Decoding is strict by default: an LLM that wraps its JSON in prose or in a
//! markdown fence produces a [`NormalizeError`]. Callers that want the legacy
//! behaviour can select [`DecodePolicy::PassThrough`], which hands back the raw
//! text instead of failing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

/// The output shape requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Plan,
    Structure,
    Code,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Plan, TaskType::Structure, TaskType::Code];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Plan => "plan",
            TaskType::Structure => "structure",
            TaskType::Code => "code",
        }
    }

    /// Whether results for this task must be decoded as JSON.
    pub fn is_structured(&self) -> bool {
        !matches!(self, TaskType::Code)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "plan" => Ok(TaskType::Plan),
            "structure" => Ok(TaskType::Structure),
            "code" => Ok(TaskType::Code),
            other => Err(format!("Unsupported task type: {other}")),
        }
    }
}

/// One step of a development plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanStep {
    pub description: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[serde(alias = "File")]
    File,
    #[serde(alias = "Directory")]
    Directory,
}

/// A node in a generated file tree.
///
/// Directories always carry a (possibly empty) child list; files never do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(no_recursion)]
    children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::File,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn children(&self) -> &[FileNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// The normalized outcome of a dispatch. Exactly one shape per task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum NormalizedResult {
    Plan(Vec<PlanStep>),
    Structure(Vec<FileNode>),
    Text(String),
}

impl NormalizedResult {
    pub fn as_plan(&self) -> Option<&[PlanStep]> {
        match self {
            NormalizedResult::Plan(steps) => Some(steps),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&[FileNode]> {
        match self {
            NormalizedResult::Structure(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NormalizedResult::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// How structured-decode failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail with a [`NormalizeError`].
    #[default]
    Strict,
    /// Return the raw text as [`NormalizedResult::Text`] and log a warning.
    PassThrough,
}

impl FromStr for DecodePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "strict" => Ok(DecodePolicy::Strict),
            "passthrough" | "pass-through" | "lenient" => Ok(DecodePolicy::PassThrough),
            other => Err(format!("unknown normalization policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{task} response is not valid structured data: {message}")]
pub struct NormalizeError {
    pub task: TaskType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: DecodePolicy,
}

impl Normalizer {
    pub fn new(policy: DecodePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    pub fn normalize(&self, raw: &str, task: TaskType) -> Result<NormalizedResult, NormalizeError> {
        let decoded = match task {
            TaskType::Code => return Ok(NormalizedResult::Text(raw.to_string())),
            TaskType::Plan => decode_plan(raw).map(NormalizedResult::Plan),
            TaskType::Structure => decode_structure(raw).map(NormalizedResult::Structure),
        };

        match decoded {
            Ok(result) => Ok(result),
            Err(message) => {
                let preview: String = raw.chars().take(100).collect();
                match self.policy {
                    DecodePolicy::Strict => {
                        tracing::error!(task = %task, response_len = raw.len(), response_preview = %preview, error = %message, "Failed to decode structured response");
                        Err(NormalizeError { task, message })
                    }
                    DecodePolicy::PassThrough => {
                        tracing::warn!(task = %task, response_len = raw.len(), response_preview = %preview, error = %message, "Structured decode failed, passing raw text through");
                        Ok(NormalizedResult::Text(raw.to_string()))
                    }
                }
            }
        }
    }
}

fn decode_plan(raw: &str) -> Result<Vec<PlanStep>, String> {
    serde_json::from_str::<Vec<PlanStep>>(raw).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct RawFileNode {
    name: String,
    #[serde(rename = "type", alias = "kind")]
    kind: FileKind,
    #[serde(default)]
    children: Option<Value>,
}

fn decode_structure(raw: &str) -> Result<Vec<FileNode>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    decode_nodes(value, "root")
}

fn decode_nodes(value: Value, parent: &str) -> Result<Vec<FileNode>, String> {
    let Value::Array(items) = value else {
        return Err(format!("expected an array of nodes under '{parent}'"));
    };

    items
        .into_iter()
        .map(|item| {
            let node: RawFileNode = serde_json::from_value(item)
                .map_err(|e| format!("invalid node under '{parent}': {e}"))?;

            match node.kind {
                FileKind::File => Ok(FileNode::file(node.name)),
                FileKind::Directory => {
                    let children = match node.children {
                        None | Some(Value::Null) => Vec::new(),
                        Some(children) => decode_nodes(children, &node.name)?,
                    };
                    Ok(FileNode::directory(node.name, children))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strict() -> Normalizer {
        Normalizer::new(DecodePolicy::Strict)
    }

    #[test]
    fn test_plan_decodes_single_step() {
        let raw = r#"[{"description":"Init repo","prompt":"scaffold"}]"#;

        let result = strict().normalize(raw, TaskType::Plan).unwrap();

        assert_eq!(
            result,
            NormalizedResult::Plan(vec![PlanStep {
                description: "Init repo".to_string(),
                prompt: "scaffold".to_string(),
            }])
        );
    }

    #[test]
    fn test_plan_preserves_step_order() {
        let raw = r#"[
            {"description":"one","prompt":"a"},
            {"description":"two","prompt":"b"},
            {"description":"three","prompt":"c"}
        ]"#;

        let result = strict().normalize(raw, TaskType::Plan).unwrap();
        let descriptions: Vec<&str> = result
            .as_plan()
            .unwrap()
            .iter()
            .map(|s| s.description.as_str())
            .collect();

        assert_eq!(descriptions, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_plan_missing_prompt_is_error() {
        let raw = r#"[{"description":"Init repo"}]"#;

        let err = strict().normalize(raw, TaskType::Plan).unwrap_err();

        assert_eq!(err.task, TaskType::Plan);
        assert!(err.message.contains("prompt"), "got: {}", err.message);
    }

    #[test]
    fn test_plan_object_instead_of_array_is_error() {
        let raw = r#"{"description":"Init repo","prompt":"scaffold"}"#;
        assert!(strict().normalize(raw, TaskType::Plan).is_err());
    }

    #[test]
    fn test_prose_fails_for_plan_but_passes_for_code() {
        let prose = "Sure! Here is your plan: first, set up the repo.";

        assert!(strict().normalize(prose, TaskType::Plan).is_err());

        let code = strict().normalize(prose, TaskType::Code).unwrap();
        assert_eq!(code.as_text(), Some(prose));
    }

    #[test]
    fn test_fenced_json_is_rejected() {
        let raw = "```json\n[{\"description\":\"a\",\"prompt\":\"b\"}]\n```";
        assert!(strict().normalize(raw, TaskType::Plan).is_err());
    }

    #[test]
    fn test_structure_decodes_nested_tree() {
        let raw = r#"[{"name":"src","type":"directory","children":[{"name":"main.ts","type":"file"}]}]"#;

        let result = strict().normalize(raw, TaskType::Structure).unwrap();
        let nodes = result.as_structure().unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "src");
        assert!(nodes[0].is_directory());
        assert_eq!(nodes[0].children(), &[FileNode::file("main.ts")]);
    }

    #[test]
    fn test_directory_without_children_defaults_to_empty() {
        let raw = r#"[{"name":"assets","type":"directory"}]"#;

        let result = strict().normalize(raw, TaskType::Structure).unwrap();

        assert_eq!(
            result,
            NormalizedResult::Structure(vec![FileNode::directory("assets", vec![])])
        );
    }

    #[test]
    fn test_file_children_are_ignored() {
        let raw = r#"[{"name":"README.md","type":"file","children":"nonsense"}]"#;

        let result = strict().normalize(raw, TaskType::Structure).unwrap();
        let node = &result.as_structure().unwrap()[0];

        assert_eq!(node.kind, FileKind::File);
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_directory_with_non_array_children_is_error() {
        let raw = r#"[{"name":"src","type":"directory","children":{"name":"x","type":"file"}}]"#;

        let err = strict().normalize(raw, TaskType::Structure).unwrap_err();
        assert!(err.message.contains("src"));
    }

    #[test]
    fn test_unknown_node_kind_is_error() {
        let raw = r#"[{"name":"link","type":"symlink"}]"#;
        assert!(strict().normalize(raw, TaskType::Structure).is_err());
    }

    #[test]
    fn test_passthrough_policy_returns_raw_text() {
        let normalizer = Normalizer::new(DecodePolicy::PassThrough);
        let prose = "not json at all";

        let result = normalizer.normalize(prose, TaskType::Structure).unwrap();

        assert_eq!(result, NormalizedResult::Text(prose.to_string()));
    }

    #[test]
    fn test_structure_serializes_with_type_field() {
        let tree = vec![FileNode::directory("src", vec![FileNode::file("lib.rs")])];

        let json = serde_json::to_value(NormalizedResult::Structure(tree)).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {"name": "src", "type": "directory", "children": [
                    {"name": "lib.rs", "type": "file"}
                ]}
            ])
        );
    }

    #[test]
    fn test_task_type_parsing() {
        assert_eq!("Plan".parse::<TaskType>(), Ok(TaskType::Plan));
        assert_eq!(" structure ".parse::<TaskType>(), Ok(TaskType::Structure));
        assert!("essay".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_decode_policy_parsing() {
        assert_eq!("strict".parse::<DecodePolicy>(), Ok(DecodePolicy::Strict));
        assert_eq!(
            "passthrough".parse::<DecodePolicy>(),
            Ok(DecodePolicy::PassThrough)
        );
        assert!("whatever".parse::<DecodePolicy>().is_err());
    }
}
