//! Bubble markup parsing
//!
//! Bubble text carries three tags: `<b>`, `</b>` and `<br>`. Anything else is
//! shown literally. Renderers turn the parsed lines into styled output.

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

const BREAK_TAGS: [&str; 3] = ["<br>", "<br/>", "<br />"];
const BOLD_OPEN: &str = "<b>";
const BOLD_CLOSE: &str = "</b>";

fn starts_with_tag(rest: &str, tag: &str) -> bool {
    rest.get(..tag.len())
        .map(|head| head.eq_ignore_ascii_case(tag))
        .unwrap_or(false)
}

fn flush(line: &mut Vec<Segment>, current: &mut String, bold: bool) {
    if !current.is_empty() {
        line.push(Segment {
            text: std::mem::take(current),
            bold,
        });
    }
}

/// Split markup into lines of styled segments.
///
/// An unclosed `<b>` stays in effect until the end of the bubble. Raw `\n`
/// breaks a line just like `<br>`.
pub fn parse(markup: &str) -> Vec<Vec<Segment>> {
    let mut lines = Vec::new();
    let mut line = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut idx = 0;

    while idx < markup.len() {
        let rest = &markup[idx..];

        if rest.starts_with('<') {
            if let Some(tag) = BREAK_TAGS.iter().find(|tag| starts_with_tag(rest, tag)) {
                flush(&mut line, &mut current, bold);
                lines.push(std::mem::take(&mut line));
                idx += tag.len();
                continue;
            }
            if starts_with_tag(rest, BOLD_OPEN) {
                flush(&mut line, &mut current, bold);
                bold = true;
                idx += BOLD_OPEN.len();
                continue;
            }
            if starts_with_tag(rest, BOLD_CLOSE) {
                flush(&mut line, &mut current, bold);
                bold = false;
                idx += BOLD_CLOSE.len();
                continue;
            }
        }

        let Some(c) = rest.chars().next() else {
            break;
        };
        idx += c.len_utf8();

        match c {
            '\n' => {
                flush(&mut line, &mut current, bold);
                lines.push(std::mem::take(&mut line));
            }
            '\r' => {}
            _ => current.push(c),
        }
    }

    flush(&mut line, &mut current, bold);
    lines.push(line);
    lines
}

/// Markup with tags removed and line breaks turned into `\n`
pub fn plain_text(markup: &str) -> String {
    parse(markup)
        .into_iter()
        .map(|line| line.into_iter().map(|s| s.text).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
