/// MarkdownV2 中需要转义的字符
const ESCAPE_CHARS: &str = r"\_*[]()~`>#+-=|{}.!";

/// 按 Telegram MarkdownV2 规则转义文本
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPE_CHARS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
