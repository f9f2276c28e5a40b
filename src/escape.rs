/// HTML escaping for interpolated values.
pub struct HtmlEscaper;

impl HtmlEscaper {
    /// Escape HTML special characters.
    pub fn escape(input: &str) -> String {
        if !input
            .chars()
            .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'' | '/'))
        {
            return input.to_string();
        }

        let mut result = String::with_capacity(input.len() + 8);
        for c in input.chars() {
            match c {
                '&' => result.push_str("&amp;"),
                '<' => result.push_str("&lt;"),
                '>' => result.push_str("&gt;"),
                '"' => result.push_str("&quot;"),
                '\'' => result.push_str("&#x27;"),
                '/' => result.push_str("&#x2F;"),
                c => result.push(c),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            HtmlEscaper::escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;&#x2F;script&gt;"
        );
    }

    #[test]
    fn test_escape_ampersand_first() {
        assert_eq!(HtmlEscaper::escape("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(HtmlEscaper::escape("plain text"), "plain text");
    }
}
