//! Prompt construction for the description request.
//!
//! [`PromptBuilder`] is a pure mapping from the current configuration and an
//! optional voice transcript to the final prompt string. No side effects, no
//! clock, no I/O — the orchestrator snapshots the configuration and hands
//! the values over.
//!
//! Policy:
//! * voice transcript present, include-default-prompt on → language default
//!   prompt, a space, then the transcript.
//! * voice transcript present, include-default-prompt off → the transcript
//!   verbatim.
//! * no transcript → the trimmed custom prompt when non-empty, otherwise the
//!   language default prompt (with `en-US` as the final fallback).

// ---------------------------------------------------------------------------
// Language → default prompt table
// ---------------------------------------------------------------------------

/// Default instruction text per supported language tag.
const LANGUAGE_PROMPTS: &[(&str, &str)] = &[
    (
        "en-US",
        "I am a blind person, and this is an image from my perspective. Please describe what I see using short but descriptive language. Address me with \"you\". No more than 50 words.",
    ),
    (
        "de-DE",
        "Ich bin blind. Das ist ein Bild aus meiner Sicht. Bitte beschreibe, was ich sehe, in kurzen, aber aussagekräftigen Worten. Sprich mich mit \"du\" an. Nicht mehr als 50 Wörter.",
    ),
    (
        "es-ES",
        "Soy una persona ciega y esta es una imagen desde mi perspectiva. Por favor, describe brevemente lo que veo, usando un lenguaje corto pero descriptivo. Háblame de \"tú\". No más de 50 palabras.",
    ),
    (
        "fr-FR",
        "Je suis une personne aveugle et ceci est une image de mon point de vue. Veuillez décrire ce que je vois en utilisant un langage court mais descriptif. Adresse-moi avec \"tu\". Pas plus de 50 mots.",
    ),
];

/// Language used when the requested tag has no table entry.
pub const FALLBACK_LANGUAGE: &str = "en-US";

/// The default prompt for `language`, falling back to the `en-US` entry for
/// unknown tags.
pub fn default_prompt(language: &str) -> &'static str {
    LANGUAGE_PROMPTS
        .iter()
        .find(|(tag, _)| *tag == language)
        .or_else(|| {
            LANGUAGE_PROMPTS
                .iter()
                .find(|(tag, _)| *tag == FALLBACK_LANGUAGE)
        })
        .map(|(_, prompt)| *prompt)
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the final prompt for one capture cycle.
///
/// # Example
/// ```rust
/// use scene_to_speech::prompt::PromptBuilder;
///
/// let builder = PromptBuilder::new("en-US", true, "");
/// let prompt = builder.build(Some("is there a dog"));
/// assert!(prompt.ends_with("is there a dog"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
    include_default_prompt: bool,
    custom_prompt: String,
}

impl PromptBuilder {
    pub fn new(
        language: impl Into<String>,
        include_default_prompt: bool,
        custom_prompt: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            include_default_prompt,
            custom_prompt: custom_prompt.into(),
        }
    }

    /// Resolve the final prompt. A transcript that is empty after trimming
    /// counts as absent, so a hold that captured no words degrades to the
    /// default-mode prompt.
    ///
    /// Always returns a non-empty string as long as the `en-US` table entry
    /// exists.
    pub fn build(&self, voice_transcript: Option<&str>) -> String {
        let transcript = voice_transcript
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match transcript {
            Some(t) if self.include_default_prompt => {
                format!("{} {}", default_prompt(&self.language), t)
            }
            Some(t) => t.to_string(),
            None => {
                let custom = self.custom_prompt.trim();
                if custom.is_empty() {
                    default_prompt(&self.language).to_string()
                } else {
                    custom.to_string()
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
