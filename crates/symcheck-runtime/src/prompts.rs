//! Fixed prompts for symptom analysis.

/// System instruction sent with every analysis request.
pub const SYSTEM_INSTRUCTION: &str = "You are a healthcare assistant that provides helpful, \
educational (non-diagnostic) information. \
Always include a disclaimer reminding users to consult medical professionals.";

/// Returned in place of an analysis when every candidate model failed.
pub const FALLBACK_MESSAGE: &str = "Sorry, all models failed to respond. \
Please check your Groq API key or try again later.";

const USER_PROMPT_PREFIX: &str = "Based on these symptoms, suggest possible conditions and next steps \
with an educational disclaimer.\n\nSymptoms:\n";

/// Embed raw symptom text into the user prompt template.
pub fn symptom_prompt(symptoms: &str) -> String {
    format!("{USER_PROMPT_PREFIX}{symptoms}")
}
