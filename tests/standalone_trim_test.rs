use serde_json::json;
use stache::{Engine, MapTemplateLocator};

fn render(source: &str, data: serde_json::Value) -> String {
    Engine::builder()
        .add_locator(MapTemplateLocator::default().with_template("t", source))
        .build()
        .unwrap()
        .render("t", &data)
        .unwrap()
}

fn render_untrimmed(source: &str, data: serde_json::Value) -> String {
    Engine::builder()
        .trim_standalone(false)
        .add_locator(MapTemplateLocator::default().with_template("t", source))
        .build()
        .unwrap()
        .render("t", &data)
        .unwrap()
}

#[test]
fn test_standalone_section_tags_leave_no_blank_lines() {
    let out = render(
        "Begin.\n{{#yes}}\nMiddle.\n{{/yes}}\nEnd.\n",
        json!({"yes": true}),
    );
    assert_eq!(out, "Begin.\nMiddle.\nEnd.\n");
}

#[test]
fn test_standalone_trimming_is_line_ending_agnostic() {
    let unix = render(
        "Begin.\n{{#yes}}\nMiddle.\n{{/yes}}\nEnd.\n",
        json!({"yes": true}),
    );
    let dos = render(
        "Begin.\r\n{{#yes}}\r\nMiddle.\r\n{{/yes}}\r\nEnd.\r\n",
        json!({"yes": true}),
    );
    assert_eq!(unix, "Begin.\nMiddle.\nEnd.\n");
    assert_eq!(dos, "Begin.\r\nMiddle.\r\nEnd.\r\n");
}

#[test]
fn test_indented_standalone_tags_are_trimmed() {
    let out = render(
        "list:\n  {{#items}}\n  - {{.}}\n  {{/items}}\n",
        json!({"items": ["a", "b"]}),
    );
    assert_eq!(out, "list:\n  - a\n  - b\n");
}

#[test]
fn test_standalone_comment_removed_entirely() {
    let out = render("a\n{{! gone }}\nb", json!({}));
    assert_eq!(out, "a\nb");
}

#[test]
fn test_inline_comment_keeps_surrounding_text() {
    let out = render("a {{! gone }} b", json!({}));
    assert_eq!(out, "a  b");
}

#[test]
fn test_interpolation_is_not_standalone() {
    let out = render("a\n{{x}}\nb", json!({"x": "v"}));
    assert_eq!(out, "a\nv\nb");
}

#[test]
fn test_standalone_delimiter_change_trimmed() {
    let out = render("a\n{{=<% %>=}}\n<%x%>", json!({"x": "v"}));
    assert_eq!(out, "a\nv");
}

#[test]
fn test_standalone_partial_trimmed() {
    let engine = Engine::builder()
        .add_locator(
            MapTemplateLocator::default()
                .with_template("t", "a\n{{>p}}\nb")
                .with_template("p", "partial"),
        )
        .build()
        .unwrap();
    assert_eq!(engine.render("t", &json!({})).unwrap(), "a\npartialb");
}

#[test]
fn test_trimming_disabled_keeps_whitespace() {
    let out = render_untrimmed("a\n{{#yes}}\nb\n{{/yes}}\n", json!({"yes": true}));
    assert_eq!(out, "a\n\nb\n\n");
}

#[test]
fn test_standalone_else_divider_trimmed() {
    let out = render(
        "{{#if x}}\nyes\n{{else}}\nno\n{{/if}}\n",
        json!({"x": false}),
    );
    assert_eq!(out, "no\n");
}

#[test]
fn test_tag_at_start_of_input_is_standalone() {
    let out = render("{{#yes}}\nx\n{{/yes}}\n", json!({"yes": true}));
    assert_eq!(out, "x\n");
}

#[test]
fn test_two_tags_on_one_line_not_standalone() {
    let out = render("{{#a}}{{#b}}\nx\n{{/b}}{{/a}}\n", json!({"a": true, "b": true}));
    assert_eq!(out, "\nx\n\n");
}
