use triage_models::agent::AgentCode;
use triage_models::request::RequestContext;

/// Output contract embedded in the classifier system prompt.
fn candidate_schema() -> String {
    let example = serde_json::json!({
        "candidates": [
            {
                "agent_code": "<one of the catalog codes>",
                "confidence": "0.85",
                "reasoning": "<one sentence on why this agent is relevant>"
            }
        ]
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

/// System prompt for the external classifier: the agent catalog plus the
/// output contract.
pub fn classifier_system_prompt() -> String {
    let catalog = AgentCode::ALL
        .iter()
        .map(|code| {
            let descriptor = code.descriptor();
            format!(
                "- {code}: {} (base priority {})",
                descriptor.display_name, descriptor.base_priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a sub-agent selector for a software engineering assistant. \
         Given a user request and ambient project context, score which \
         sub-agents are relevant.\n\n\
         Available sub-agents:\n{catalog}\n\n\
         Scoring rules:\n\
         - confidence is a decimal string between \"0.0\" and \"1.0\"\n\
         - include an agent only when something in the request or context \
         supports it\n\
         - prefer a few well-supported agents over many speculative ones\n\
         - an empty candidates array is a valid answer\n\n\
         Respond ONLY with a JSON object matching:\n{schema}",
        schema = candidate_schema()
    )
}

/// User prompt combining the request text with whatever context the caller
/// supplied.
pub fn classifier_user_prompt(request_text: &str, context: &RequestContext) -> String {
    serde_json::to_string_pretty(&serde_json::json!({
        "request": request_text,
        "context": context,
    }))
    .unwrap_or_default()
}
