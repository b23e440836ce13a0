use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<[/!?]?[A-Za-z][^>]*>").expect("static regex compiles")
});
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("static regex compiles")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex compiles"));

/// Reduces HTML-ish rich text to plain text with single spaces between
/// what used to be separate elements.
///
/// Runs two strip and decode rounds: Azure test steps carry HTML escaped
/// inside XML, which only turns into tags after the first decode.
pub fn strip_markup(raw: &str) -> String {
    let once = strip_and_decode(raw);
    let twice = strip_and_decode(&once);
    WHITESPACE.replace_all(&twice, " ").trim().to_string()
}

fn strip_and_decode(text: &str) -> String {
    let without_tags = TAG.replace_all(text, " ");
    ENTITY
        .replace_all(&without_tags, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match name {
        "nbsp" => " ",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_with_single_space_separation() {
        let html = "<div>Open the app</div><div>Tap <b>Save</b></div>";
        assert_eq!(strip_markup(html), "Open the app Tap Save");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            strip_markup("a&nbsp;&lt; b &gt; &amp; &#39;c&#39; &#x41;"),
            "a < b > & 'c' A"
        );
    }

    #[test]
    fn keeps_unknown_entities_and_plain_text() {
        assert_eq!(strip_markup("  R&D &copy;\n\n plan "), "R&D &copy; plan");
    }

    #[test]
    fn drops_comments() {
        assert_eq!(strip_markup("<!-- hidden <b> -->shown"), "shown");
    }

    #[test]
    fn keeps_comparison_signs_and_arrows() {
        assert_eq!(
            strip_markup("Settings -> Profile, ensure count < 10 and > 2"),
            "Settings -> Profile, ensure count < 10 and > 2"
        );
        assert_eq!(strip_markup("<p>a <= b</p>"), "a <= b");
    }

    #[test]
    fn strips_html_escaped_inside_test_steps() {
        let steps = concat!(
            r#"<steps id="0" last="3"><step id="2" type="ActionStep">"#,
            r#"<parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;Open the app&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>"#,
            r#"<parameterizedString isformatted="true">&lt;DIV&gt;&lt;P&gt;&lt;BR/&gt;&lt;/P&gt;&lt;/DIV&gt;</parameterizedString>"#,
            r#"<description/></step><step id="3" type="ActionStep">"#,
            r#"<parameterizedString isformatted="true">&lt;P&gt;Tap&amp;nbsp;Save&lt;/P&gt;</parameterizedString>"#,
            r#"<parameterizedString isformatted="true">&lt;P&gt;Saved&lt;/P&gt;</parameterizedString>"#,
            r#"<description/></step></steps>"#,
        );
        let text = strip_markup(steps);
        assert!(!text.contains('<'), "{text}");
        assert_eq!(text, "Open the app Tap Save Saved");
    }
}
