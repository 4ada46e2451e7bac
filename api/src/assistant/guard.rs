use crate::assistant::prompts;
use crate::assistant::provider::{ChatMessage, ChatRequest, CompletionProvider, ProviderError};

/// The two moderation stages, one parameterized capability. Each maps to a
/// (system prompt, model) pair; ordering between them is decided by the
/// pipeline, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPurpose {
    PromptInjection,
    Safety,
}

impl GuardPurpose {
    pub fn model(self) -> &'static str {
        match self {
            GuardPurpose::PromptInjection => prompts::INJECTION_GUARD_MODEL,
            GuardPurpose::Safety => prompts::SAFETY_GUARD_MODEL,
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            GuardPurpose::PromptInjection => prompts::INJECTION_GUARD_PROMPT,
            GuardPurpose::Safety => prompts::SAFETY_GUARD_PROMPT,
        }
    }

    /// Canned refusal shown to the user when this guard blocks. Worded to
    /// redirect to the nutritionist, never exposing moderation internals.
    pub fn refusal(self) -> &'static str {
        match self {
            GuardPurpose::PromptInjection => prompts::INJECTION_REFUSAL,
            GuardPurpose::Safety => prompts::SAFETY_REFUSAL,
        }
    }
}

/// A verdict counts as ALLOW only on a case-insensitive prefix match.
/// Guard models occasionally append tokens past the first; anything that
/// does not start with ALLOW resolves to BLOCK.
pub fn verdict_allows(raw: &str) -> bool {
    raw.trim().to_uppercase().starts_with("ALLOW")
}

/// Run one guard over the raw user message. `Ok(true)` means allow.
/// Provider failures propagate; a guard that cannot run must not be
/// treated as a guard that allowed.
pub async fn classify<P: CompletionProvider>(
    provider: &P,
    purpose: GuardPurpose,
    message: &str,
) -> Result<bool, ProviderError> {
    let verdict = provider
        .chat(ChatRequest {
            model: purpose.model().to_string(),
            messages: vec![
                ChatMessage::system(purpose.system_prompt()),
                ChatMessage::user(message),
            ],
            temperature: prompts::GUARD_TEMPERATURE,
            max_tokens: prompts::GUARD_MAX_TOKENS,
        })
        .await?;

    let allowed = verdict_allows(&verdict);
    tracing::debug!(
        purpose = ?purpose,
        allowed = allowed,
        "guard verdict"
    );
    Ok(allowed)
}
