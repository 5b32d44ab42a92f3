//! System instructions for each task type
//!
//! Each task gets one fixed instruction. The plan and structure instructions
//! describe the exact JSON shape the normalizer decodes, and both ask for the
//! bare JSON with nothing around it because decoding is strict.

use crate::normalize::TaskType;

const PLAN_INSTRUCTION: &str = r#"You are a senior software architect. Break the user's request into an ordered development plan.
Return a JSON array where each element is an object with exactly two string fields:
- "description": what this step accomplishes
- "prompt": a self-contained prompt that a code generator can follow to implement the step

Respond with the JSON array only. Do not wrap it in markdown and do not add any text before or after it.
Example format:
[
  {"description": "Initialize the repository", "prompt": "Create a package.json with a build script"},
  {"description": "Add the HTTP server", "prompt": "Write src/server.ts exposing GET /health"}
]"#;

const STRUCTURE_INSTRUCTION: &str = r#"You are a senior software architect. Design the file and folder layout for the user's project.
Return a JSON array of nodes. Each node is an object with:
- "name": the file or directory name
- "type": either "file" or "directory"
- "children": an array of nodes, only for directories

Respond with the JSON array only. Do not wrap it in markdown and do not add any text before or after it.
Example format:
[
  {"name": "src", "type": "directory", "children": [
    {"name": "main.ts", "type": "file"}
  ]},
  {"name": "package.json", "type": "file"}
]"#;

const CODE_INSTRUCTION: &str = r#"You are an expert programmer. Write the code the user asks for.
Respond with the code only: no explanations, no commentary, no markdown fences."#;

/// Fixed system instruction for a task type.
///
/// # Example
/// ```
/// use plangate::llm::prompts::system_instruction;
/// use plangate::normalize::TaskType;
///
/// assert!(system_instruction(TaskType::Plan).contains("\"description\""));
/// assert!(system_instruction(TaskType::Structure).contains("\"children\""));
/// ```
pub fn system_instruction(task: TaskType) -> &'static str {
    match task {
        TaskType::Plan => PLAN_INSTRUCTION,
        TaskType::Structure => STRUCTURE_INSTRUCTION,
        TaskType::Code => CODE_INSTRUCTION,
    }
}
