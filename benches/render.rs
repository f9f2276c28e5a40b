use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use stache::{Engine, MapTemplateLocator};

const PAGE: &str = "\
<ul>
{{#each users}}
  <li>{{name}} ({{iter.index}}){{#if iter.has_next}},{{/if}}</li>
{{/each}}
</ul>
{{^users}}no users{{/users}}
";

fn build_engine() -> Engine {
    Engine::builder()
        .add_locator(
            MapTemplateLocator::default()
                .with_template("page", PAGE)
                .with_template("row", "{{a}}{{b.c}}{{#list}}{{.}}{{/list}}"),
        )
        .build()
        .unwrap()
}

fn bench_compile(c: &mut Criterion) {
    let engine = build_engine();
    c.bench_function("compile_page", |b| {
        b.iter(|| engine.compile("bench", black_box(PAGE)).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let engine = build_engine();
    let users: Vec<_> = (0..50).map(|i| json!({"name": format!("user{i}")})).collect();
    let data = json!({ "users": users });
    engine.get_template("page").unwrap();

    c.bench_function("render_page_50_users", |b| {
        b.iter(|| engine.render("page", black_box(&data)).unwrap())
    });

    let row_data = json!({"a": 1, "b": {"c": 2}, "list": [1, 2, 3]});
    c.bench_function("render_row", |b| {
        b.iter(|| engine.render("row", black_box(&row_data)).unwrap())
    });
}

criterion_group!(benches, bench_compile, bench_render);
criterion_main!(benches);
