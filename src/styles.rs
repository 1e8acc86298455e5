//! Response style catalog: maps a style key to a system instruction.

/// Style applied when the client sends none, or an unrecognized one.
pub const DEFAULT_STYLE: &str = "explain";

const EXPLAIN: &str = "Provide clear, step-by-step explanations with examples. \
     Break down complex topics into digestible parts. Use analogies when helpful.";
const DETERMINISTIC: &str = "Give concise, direct, and consistent answers. \
     Be precise and to the point. Avoid unnecessary elaboration.";
const CREATIVE: &str = "Be imaginative and flexible. Use creative language and \
     explore multiple perspectives. Feel free to use metaphors and storytelling.";

/// Instruction fragment for a style key. Unknown keys fall back to the
/// default; style selection must never fail a request.
pub fn instruction_for(style: &str) -> &'static str {
    match style {
        "deterministic" => DETERMINISTIC,
        "creative" => CREATIVE,
        _ => EXPLAIN,
    }
}

/// Full system instruction for a request.
pub fn system_instruction(style: Option<&str>) -> String {
    let fragment = instruction_for(style.unwrap_or(DEFAULT_STYLE));
    format!("You are a helpful assistant. {fragment}")
}
