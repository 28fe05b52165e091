//! Lightweight Markdown-like formatting for recommendation replies

use regex::Regex;
use std::sync::OnceLock;

/// Line-break marker understood by every bubble renderer
pub const LINE_BREAK: &str = "<br>";

// Content may not cross a line terminator.
fn bold_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*([^\n\r\x{2028}\x{2029}]*?)\*\*").expect("bold pattern is valid")
    })
}

fn bullet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\n\* ([^\n\r\x{2028}\x{2029}]*)").expect("bullet pattern is valid")
    })
}

/// Turn a raw model reply into bubble markup.
///
/// Applied in order:
/// 1. `**text**` becomes `<b>text</b>` (non-greedy, within one line)
/// 2. a line break followed by `* ` becomes `<br>* `, provided the bullet
///    line runs cleanly to the next `\n` or the end of input
/// 3. every remaining `\n` becomes `<br>`
/// 4. every `\r` is dropped
///
/// Not idempotent in general.
pub fn format_response(text: &str) -> String {
    let bolded = bold_pattern().replace_all(text, "<b>${1}</b>");
    let bulleted = normalize_bullets(&bolded);
    bulleted.replace('\n', LINE_BREAK).replace('\r', "")
}

fn normalize_bullets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in bullet_pattern().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always matches");
        let rest = &text[whole.end()..];
        // A bullet cut short by \r or a Unicode separator is left alone.
        if !(rest.is_empty() || rest.starts_with('\n')) {
            continue;
        }

        out.push_str(&text[last..whole.start()]);
        out.push_str(LINE_BREAK);
        out.push_str("* ");
        out.push_str(&caps[1]);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    out
}
