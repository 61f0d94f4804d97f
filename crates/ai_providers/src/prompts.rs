//! Refinement prompt templates

use domain::RefinementMode;

const PREAMBLE: &str = "You edit dictated text. Return only the edited text, without \
                        commentary, quotes or markdown fences. Keep the speaker's meaning.";

/// System prompt for a refinement mode
#[must_use]
pub fn system_prompt(mode: &RefinementMode) -> String {
    let instruction = match mode {
        RefinementMode::Clean => "Fix punctuation, capitalisation and obvious transcription \
                                  errors. Remove filler words and false starts. Do not \
                                  rephrase."
            .to_string(),
        RefinementMode::Formal => {
            "Rewrite the text in a clear, formal register suitable for business \
             correspondence."
                .to_string()
        },
        RefinementMode::Casual => {
            "Rewrite the text in a relaxed, conversational tone.".to_string()
        },
        RefinementMode::Summarize => {
            "Summarize the text in a few sentences, keeping every decision and action \
             item."
                .to_string()
        },
        RefinementMode::Bullets => {
            "Turn the text into a concise bullet list, one idea per line, each line \
             starting with \"- \"."
                .to_string()
        },
        RefinementMode::Translate(language) => {
            format!("Translate the text into the language with code \"{language}\".")
        },
    };
    format!("{PREAMBLE}\n\n{instruction}")
}

/// Single prompt for engines without a separate system role
#[must_use]
pub fn inline_prompt(mode: &RefinementMode, text: &str) -> String {
    format!("{}\n\nText:\n{text}", system_prompt(mode))
}
