//! Server-rendered pages.

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const DETECT_TEMPLATE: &str = include_str!("../../templates/detect.html");
const CHAT_TEMPLATE: &str = include_str!("../../templates/chatbot.html");

const EXCHANGE_SLOT: &str = "{{ exchange }}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn index() -> String {
    INDEX_TEMPLATE.to_string()
}

pub fn detect() -> String {
    DETECT_TEMPLATE.to_string()
}

/// Chat page, with the last question and answer when there is one
pub fn chat(exchange: Option<(&str, &str)>) -> String {
    let block = match exchange {
        Some((question, answer)) => format!(
            "<section class=\"exchange\">\n  <p class=\"question\"><strong>You:</strong> {}</p>\n  <p class=\"answer\"><strong>Assistant:</strong> {}</p>\n</section>",
            escape_html(question),
            escape_html(answer)
        ),
        None => String::new(),
    };
    CHAT_TEMPLATE.replace(EXCHANGE_SLOT, &block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
        assert_eq!(escape_html("2+2"), "2+2");
    }

    #[test]
    fn test_chat_without_exchange() {
        let page = chat(None);
        assert!(!page.contains(EXCHANGE_SLOT));
        assert!(!page.contains("class=\"exchange\""));
        assert!(page.contains("name=\"question\""));
    }

    #[test]
    fn test_chat_with_exchange() {
        let page = chat(Some(("2+2", "4")));
        assert!(page.contains("2+2"));
        assert!(page.contains("<strong>Assistant:</strong> 4"));
    }

    #[test]
    fn test_chat_escapes_user_text() {
        let page = chat(Some(("<script>alert(1)</script>", "ok")));
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_static_pages_link_routes() {
        assert!(index().contains("href=\"/detect\""));
        assert!(index().contains("href=\"/chat\""));
        assert!(detect().contains("/api/emotion"));
    }
}
