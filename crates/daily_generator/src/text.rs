//! Post-processing of raw model output into a title and a body fragment.

use scraper::Html;

use crate::prompt::FORBIDDEN_TAGS;

const STRIPPED_CHARS: [char; 2] = ['*', '`'];
const BULLET_GLYPHS: [char; 8] = ['•', '-', '–', '—', '·', '▪', '*', '#'];

pub const DEFAULT_TITLE_PREFIX: &str = "Daily Insight – ";

/// Removes list markup, stray markdown characters and leading bullets.
pub fn sanitize_model_output(raw: &str) -> String {
    let without_lists = remove_list_markup(raw);

    let lines = without_lists
        .lines()
        .map(strip_leading_bullet)
        .map(|line| line.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect::<String>())
        .collect::<Vec<_>>();

    lines.join("\n").trim().to_string()
}

/// Plain text of an HTML fragment.
pub fn strip_tags(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("")
}

/// Title from the first non-blank line, or the dated default.
pub fn derive_title(body: &str, date: &str) -> String {
    let title = body
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| strip_tags(line).trim().to_string())
        .unwrap_or_default();

    if title.is_empty() {
        format!("{}{}", DEFAULT_TITLE_PREFIX, date)
    } else {
        title
    }
}

/// Drops a leading copy of `title` so it is not rendered twice.
///
/// Matches either a leading `<h1>`..`<h6>` whose text equals the title
/// case-insensitively, or a leading plain line equal to the title. Only the
/// duplicate and the line break that ends it are removed.
pub fn remove_title_from_body(body: &str, title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return body.to_string();
    }

    let trimmed = body.trim_start();
    if let Some(rest) = strip_leading_heading(trimmed, title) {
        return strip_line_end(rest).to_string();
    }

    let (first_line, rest) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    if first_line.trim() == title {
        return rest.to_string();
    }

    body.to_string()
}

/// Drops the rest of the current line when it is blank, terminator included.
fn strip_line_end(text: &str) -> &str {
    let after_blanks = text.trim_start_matches([' ', '\t']);
    after_blanks
        .strip_prefix("\r\n")
        .or_else(|| after_blanks.strip_prefix('\n'))
        .unwrap_or(text)
}

fn strip_leading_heading<'a>(html: &'a str, title: &str) -> Option<&'a str> {
    let bytes = html.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'<' || !bytes[1].eq_ignore_ascii_case(&b'h') {
        return None;
    }
    let level = bytes[2];
    if !(b'1'..=b'6').contains(&level) || !(bytes[3] == b'>' || bytes[3].is_ascii_whitespace()) {
        return None;
    }

    let open_end = html.find('>')? + 1;
    let close = format!("</h{}>", level as char);
    // ASCII lowercasing keeps byte offsets stable.
    let close_start = html.to_ascii_lowercase()[open_end..].find(&close)? + open_end;

    let text = strip_tags(&html[open_end..close_start]);
    if text.trim().to_lowercase() != title.to_lowercase() {
        return None;
    }
    Some(&html[close_start + close.len()..])
}

fn strip_leading_bullet(line: &str) -> &str {
    let trimmed = line.trim_start();
    let Some(first) = trimmed.chars().next() else {
        return line;
    };
    if !BULLET_GLYPHS.contains(&first) {
        return line;
    }

    // Runs such as "###" or "**" count as one marker.
    let after = trimmed.trim_start_matches(first);
    match after.chars().next() {
        Some(c) if c.is_whitespace() => after.trim_start(),
        _ => line,
    }
}

fn remove_list_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match list_tag_len(tail) {
            Some(len) => rest = &tail[len..],
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Byte length of a `<ul>`/`</li attr>`-style tag at the start of `tail`.
fn list_tag_len(tail: &str) -> Option<usize> {
    let end = tail.find('>')?;
    let inner = tail[1..end].trim_start_matches('/');
    let name_len = inner
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(inner.len());
    let name = &inner[..name_len];

    FORBIDDEN_TAGS
        .iter()
        .any(|tag| name.eq_ignore_ascii_case(tag))
        .then_some(end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_list_markup_and_markdown() {
        let raw = "**Bold claim**\n<UL class=\"x\">\n<li>first</li>\n</ul>\n`code` stays";
        assert_eq!(sanitize_model_output(raw), "Bold claim\n\nfirst\n\ncode stays");
    }

    #[test]
    fn strips_leading_bullets_only() {
        let raw = "• one\n  - two\n## Heading\n-5 degrees\nrange 3 - 4";
        assert_eq!(
            sanitize_model_output(raw),
            "one\ntwo\nHeading\n-5 degrees\nrange 3 - 4"
        );
    }

    #[test]
    fn leaves_other_tags_and_comparisons() {
        let raw = "<p>a < b and <link> is kept</p>";
        assert_eq!(sanitize_model_output(raw), raw);
    }

    #[test]
    fn title_comes_from_first_non_blank_line() {
        let body = "\n\n  <h1>The <em>Quiet</em> Revolution</h1>\n<p>text</p>";
        assert_eq!(derive_title(body, "2024-01-01"), "The Quiet Revolution");
    }

    #[test]
    fn title_falls_back_to_dated_default() {
        assert_eq!(derive_title("   \n\n", "2024-01-01"), "Daily Insight – 2024-01-01");
        assert_eq!(derive_title("<div></div>\n<p>x</p>", "2024-01-02"), "Daily Insight – 2024-01-02");
    }

    #[test]
    fn removes_duplicate_heading_case_insensitively() {
        let body = "<h2 class=\"t\">The QUIET revolution</H2>\n\n<p>Rest &amp; more</p>\n<h2>Next</h2>";
        assert_eq!(
            remove_title_from_body(body, "The quiet revolution"),
            "\n<p>Rest &amp; more</p>\n<h2>Next</h2>"
        );
    }

    #[test]
    fn keeps_everything_after_the_duplicate_line() {
        assert_eq!(remove_title_from_body("<h1>T</h1>\n\n   <p>x</p>", "T"), "\n   <p>x</p>");
        assert_eq!(remove_title_from_body("<h1>T</h1> \r\n<p>x</p>", "T"), "<p>x</p>");
        assert_eq!(remove_title_from_body("<h1>T</h1><p>x</p>", "T"), "<p>x</p>");
        assert_eq!(remove_title_from_body("T\n\n  <p>x</p>", "T"), "\n  <p>x</p>");
    }

    #[test]
    fn removes_duplicate_plain_line() {
        let body = "The Quiet Revolution\n<p>Intro</p>\n<h2>Part</h2>";
        assert_eq!(
            remove_title_from_body(body, "The Quiet Revolution"),
            "<p>Intro</p>\n<h2>Part</h2>"
        );
    }

    #[test]
    fn body_without_duplicate_is_unchanged() {
        let body = "  <p>The Quiet Revolution</p>\n<h2>Part</h2>";
        assert_eq!(remove_title_from_body(body, "The Quiet Revolution"), body);

        let heading = "<h2>Something else</h2>\n<p>x</p>";
        assert_eq!(remove_title_from_body(heading, "Title"), heading);
        assert_eq!(remove_title_from_body(heading, ""), heading);
    }
}
