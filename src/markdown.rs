/// Escapes characters that legacy Telegram Markdown would treat as entity markers
///
/// # Arguments
///
/// * 'text' - free text to embed in a Markdown message
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
