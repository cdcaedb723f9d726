pub const CAPTION: &str = include_str!("../data/prompts/caption.txt");

/// Upper bound on caption length requested from every provider.
pub const MAX_CAPTION_WORDS: usize = 20;

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// The instruction sent alongside the image.
pub fn caption_prompt() -> String {
    render(
        CAPTION.trim(),
        &[("max_words", &MAX_CAPTION_WORDS.to_string())],
    )
}
