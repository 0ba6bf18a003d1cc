// Shared prompt fragments. Each feature that calls the completion service
// keeps its own prompts.rs alongside it; this file holds the cross-cutting parts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to the user prompt when the provider cannot be asked for JSON mode.
pub const BRACES_ONLY_INSTRUCTION: &str = "\n\nIMPORTANT: Your entire response must be a single JSON object. \
    Start your response with { and end it with }.";
