use common::ChatMessage;

pub const ALLOWED_TAGS: [&str; 6] = ["h2", "h3", "p", "strong", "em", "blockquote"];
pub const FORBIDDEN_TAGS: [&str; 3] = ["ul", "ol", "li"];
const WORD_TARGET: &str = "900 to 1200";

const SYSTEM_PROMPT: &str = "You are a thoughtful staff writer for a daily long-form publication. \
You write for curious, educated readers who are not specialists. \
Your tone is warm, precise and free of hype. \
You answer with a finished article only, never with commentary about the article.";

/// System and user instructions for one day's article.
pub fn build_messages(topic: &str, date: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt(topic, date))]
}

fn user_prompt(topic: &str, date: &str) -> String {
    let allowed = ALLOWED_TAGS
        .iter()
        .map(|t| format!("<{}>", t))
        .collect::<Vec<_>>()
        .join(", ");
    let forbidden = FORBIDDEN_TAGS
        .iter()
        .map(|t| format!("<{}>", t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Write today's article ({date}) on the following subject:\n\
         {topic}\n\n\
         Requirements:\n\
         1. The first line is the article title on its own, as plain text.\n\
         2. Open with an introduction of one or two paragraphs.\n\
         3. Continue with 3 to 5 subsections, each starting with an <h2> heading.\n\
         4. Close with a synthesis that ties the subsections together.\n\
         5. Use only these HTML tags: {allowed}.\n\
         6. Never use {forbidden}, markdown, asterisks or bullet characters; write in prose.\n\
         7. Aim for {WORD_TARGET} words."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_system_then_user_message() {
        let messages = build_messages("Databases", "2024-05-01");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Databases"));
        assert!(messages[1].content.contains("2024-05-01"));
        assert!(messages[1].content.contains("<blockquote>"));
        assert!(messages[1].content.contains("Never use <ul>, <ol>, <li>"));
    }
}
