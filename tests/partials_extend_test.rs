use serde_json::json;
use stache::{Engine, MapTemplateLocator};

fn engine_with(templates: &[(&str, &str)]) -> Engine {
    let mut locator = MapTemplateLocator::default();
    for (name, source) in templates {
        locator = locator.with_template(*name, *source);
    }
    Engine::builder().add_locator(locator).build().unwrap()
}

#[test]
fn test_partial_renders_with_current_context() {
    let engine = engine_with(&[
        ("page", "{{#user}}{{>card}}{{/user}}"),
        ("card", "[{{name}}]"),
    ]);
    assert_eq!(
        engine
            .render("page", &json!({"user": {"name": "Ada"}}))
            .unwrap(),
        "[Ada]"
    );
}

#[test]
fn test_partial_resolved_lazily() {
    // The partial does not need to exist at compile time of the referrer.
    let engine = engine_with(&[("page", "{{>later}}"), ("later", "here")]);
    engine.get_template("page").unwrap();
    assert_eq!(engine.render("page", &json!({})).unwrap(), "here");
}

#[test]
fn test_missing_partial_is_fatal_and_names_the_key() {
    let engine = engine_with(&[("page", "{{>nope}}")]);
    let err = engine.render("page", &json!({})).unwrap_err();
    assert_eq!(err.error_code(), "E_RENDER_INVALID_PARTIAL_KEY");
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_self_referential_partial_hits_recursion_limit() {
    let engine = Engine::builder()
        .recursion_limit(5)
        .add_locator(MapTemplateLocator::default().with_template("a", "{{>a}}"))
        .build()
        .unwrap();
    let err = engine.render("a", &json!({})).unwrap_err();
    assert_eq!(err.error_code(), "E_RENDER_RECURSIVE_LIMIT_EXCEEDED");
    assert!(err.to_string().contains('5'));
}

#[test]
fn test_mutually_recursive_partials_hit_recursion_limit() {
    let engine = Engine::builder()
        .recursion_limit(8)
        .add_locator(
            MapTemplateLocator::default()
                .with_template("a", "{{>b}}")
                .with_template("b", "{{>a}}"),
        )
        .build()
        .unwrap();
    let err = engine.render("a", &json!({})).unwrap_err();
    assert_eq!(err.error_code(), "E_RENDER_RECURSIVE_LIMIT_EXCEEDED");
}

#[test]
fn test_bounded_recursion_terminates() {
    // Recursion through a section only descends while data is present.
    let engine = engine_with(&[("node", "{{value}}{{#child}}>{{>node}}{{/child}}")]);
    let data = json!({"value": 1, "child": {"value": 2, "child": {"value": 3}}});
    assert_eq!(engine.render("node", &data).unwrap(), "1>2>3");
}

#[test]
fn test_extend_fills_override_point() {
    let engine = engine_with(&[
        ("base", "<{{$title}}default{{/title}}>"),
        ("page", "{{<base}}{{$title}}custom{{/title}}{{/base}}"),
    ]);
    assert_eq!(engine.render("page", &json!({})).unwrap(), "<custom>");
}

#[test]
fn test_extend_unmatched_point_uses_default_body() {
    let engine = engine_with(&[
        ("base", "<{{$title}}default{{/title}}|{{$footer}}foot{{/footer}}>"),
        ("page", "{{<base}}{{$title}}custom{{/title}}{{/base}}"),
    ]);
    assert_eq!(engine.render("page", &json!({})).unwrap(), "<custom|foot>");
}

#[test]
fn test_extend_content_outside_overrides_ignored() {
    let engine = engine_with(&[
        ("base", "[{{$s}}d{{/s}}]"),
        ("page", "{{<base}}IGNORED{{$s}}o{{/s}}{{/base}}"),
    ]);
    assert_eq!(engine.render("page", &json!({})).unwrap(), "[o]");
}

#[test]
fn test_chained_extends_most_derived_wins() {
    let engine = engine_with(&[
        ("grand", "({{$slot}}grand{{/slot}})"),
        ("parent", "{{<grand}}{{$slot}}parent{{/slot}}{{/grand}}"),
        ("child", "{{<parent}}{{$slot}}child{{/slot}}{{/parent}}"),
    ]);
    assert_eq!(engine.render("child", &json!({})).unwrap(), "(child)");
}

#[test]
fn test_missing_extend_is_fatal() {
    let engine = engine_with(&[("page", "{{<void}}{{/void}}")]);
    let err = engine.render("page", &json!({})).unwrap_err();
    assert_eq!(err.error_code(), "E_RENDER_INVALID_EXTEND_KEY");
}

#[test]
fn test_extend_sees_render_data() {
    let engine = engine_with(&[
        ("base", "{{$body}}{{/body}} by {{author}}"),
        ("page", "{{<base}}{{$body}}{{title}}{{/body}}{{/base}}"),
    ]);
    assert_eq!(
        engine
            .render("page", &json!({"title": "T", "author": "A"}))
            .unwrap(),
        "T by A"
    );
}
