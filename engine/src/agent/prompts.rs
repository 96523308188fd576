//! System guidance
//!
//! The fixed tool-usage policy that seeds every run, and the steering
//! message appended after a round that fetched skill content.

use crate::tools::{EXECUTE_PYTHON_CODE, GET_SKILL_CONTENT, LIST_SKILLS_CATALOG};

/// Policy message that opens every conversation
pub fn system_policy() -> String {
    format!(
        "You are a helpful assistant.\n\
         To decide whether a skill applies, first call {catalog} to get the catalog; \
         once one matches, call {content}(name) to read its instructions. \
         If no skill is needed, answer directly. Always choose a single skill and \
         never chain several skills together.\n\n\
         Important: when the task is to produce a file (a presentation, PDF, document and so on), \
         use the {execute} tool to run the code and create the file. \
         Do not hand code to the user to run manually; call {execute} yourself.",
        catalog = LIST_SKILLS_CATALOG,
        content = GET_SKILL_CONTENT,
        execute = EXECUTE_PYTHON_CODE,
    )
}

/// Steering appended once a skill's content is in the conversation.
///
/// A skill may carry its own steering text; otherwise the generic guidance is used.
pub fn skill_steering(custom: Option<&str>) -> String {
    if let Some(text) = custom.map(str::trim).filter(|text| !text.is_empty()) {
        return text.to_string();
    }

    format!(
        "You now have the complete instructions for the skill.\n\n\
         1. For tasks that produce files, write complete Python code.\n\
         2. Then call the {execute} tool to run that code and create the file.\n\
         3. Include full file paths, content generation and error handling in the code.\n\
         4. Tailor the content to what the user asked for.\n\
         5. Once execution succeeds, tell the user the file was created and its name.\n\n\
         Follow the instructions' template literally and call {execute} now \
         instead of printing the code.",
        execute = EXECUTE_PYTHON_CODE,
    )
}
