//! Prompt builders for the writing actions and the popup's free-form ask.
//! Pure functions; the router supplies preset and language from settings.

pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_PRESET: &str = "default";

fn tone_fragment(preset: &str) -> Option<&'static str> {
    match preset {
        "professional" => Some("Use a polished, professional tone."),
        "casual" => Some("Keep the tone relaxed and conversational."),
        "email" => Some("Write it as polished email prose."),
        "social" => Some("Make it punchy and suited to a social media post."),
        // "default" and unknown presets add no tone constraint.
        _ => None,
    }
}

pub fn writing_prompt(action: &str, preset: &str, text: &str, language: &str) -> String {
    let mut prompt = match action {
        "improve" => "Improve the following text. Keep its meaning, fix awkward phrasing, and \
                      make it read naturally."
            .to_string(),
        "grammar" => "Correct the grammar, spelling, and punctuation of the following text \
                      without changing its meaning."
            .to_string(),
        "translate" => {
            format!("Translate the following text into {language}. Preserve tone and formatting.")
        }
        "summarize" => "Summarize the following text in a few clear sentences.".to_string(),
        "reply" => "Write a reply to the following message.".to_string(),
        "emojify" => "Rewrite the following text with fitting emojis woven in.".to_string(),
        other => format!("Apply the '{other}' transformation to the following text."),
    };

    if let Some(tone) = tone_fragment(preset) {
        prompt.push(' ');
        prompt.push_str(tone);
    }
    prompt.push_str(" Respond with the transformed text only, no preamble.\n\n");
    prompt.push_str(text);
    prompt
}

pub fn quick_ask_prompt(query: &str, preset: &str) -> String {
    let mut prompt = String::from("Answer the following question concisely.");
    if let Some(tone) = tone_fragment(preset) {
        prompt.push(' ');
        prompt.push_str(tone);
    }
    prompt.push_str("\n\n");
    prompt.push_str(query);
    prompt
}
