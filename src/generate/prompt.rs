//! Gloss-to-English prompt construction and completion cleanup.

const INSTRUCTION: &str = "You are a gloss-to-English converter. Output only the sentence using only given gloss tokens. No need to complete it with additional words. No explanations.";

/// Builds the completion prompt for `gloss`.
///
/// Prior output is passed as a `Context:` line so the model can continue the
/// conversation; it is omitted when there is none.
pub fn build_prompt(gloss: &str, context: &str) -> String {
    let context = context.trim();
    if context.is_empty() {
        format!("{INSTRUCTION}\nGloss: {gloss}\nSentence:")
    } else {
        format!("{INSTRUCTION}\nContext: {context}\nGloss: {gloss}\nSentence:")
    }
}

/// Token budget for a completion: one per gloss word plus one per prompt word.
pub fn max_tokens(gloss: &str, prompt: &str) -> u32 {
    let words = gloss.split_whitespace().count() + prompt.split_whitespace().count();
    u32::try_from(words).unwrap_or(u32::MAX)
}

/// Reduces a raw completion to a single clean sentence.
///
/// Removes an echoed prompt, drops anything from the first `(` on (models
/// like to append parenthesised notes), turns `_` compound glosses into
/// spaces and keeps only the first line.
pub fn tidy_output(raw: &str, prompt: &str) -> String {
    let mut text = if !prompt.is_empty() && raw.contains(prompt) {
        raw.replace(prompt, "")
    } else {
        raw.to_string()
    };

    if let Some(idx) = text.find('(') {
        text.truncate(idx);
    }

    let text = text.trim().replace('_', " ");
    text.trim().lines().next().unwrap_or("").trim().to_string()
}
