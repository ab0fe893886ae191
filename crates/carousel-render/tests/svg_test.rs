use carousel_core::{PlanConfig, StyleMap, StyleSpec, WeightTable, plan};
use carousel_render::{Error, SvgRenderOptions, render_svg};

fn weather() -> WeightTable {
    WeightTable::from_matrix(["rainy", "sunny"], vec![vec![0.5, 0.5], vec![0.4, 0.6]]).unwrap()
}

fn render_table(
    table: &WeightTable,
    config: &PlanConfig,
    options: &SvgRenderOptions,
) -> carousel_render::Result<String> {
    let p = plan(table, config)?;
    render_svg(&p, options)
}

fn count(doc: &roxmltree::Document<'_>, tag: &str, class: &str) -> usize {
    doc.descendants()
        .filter(|n| n.has_tag_name(tag))
        .filter(|n| {
            n.attribute("class")
                .is_some_and(|c| c.split_whitespace().any(|c| c == class))
        })
        .count()
}

#[test]
fn weather_svg_has_one_path_and_head_per_edge() {
    let cfg = PlanConfig {
        edge_labels: StyleSpec::Auto,
        ..Default::default()
    };
    let svg = render_table(&weather(), &cfg, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();

    let root = doc.root_element();
    assert_eq!(root.attribute("viewBox"), Some("0 0 600 600"));
    assert_eq!(root.attribute("id"), Some("carousel"));

    assert_eq!(count(&doc, "path", "edge"), 4);
    assert_eq!(count(&doc, "polygon", "arrow-head"), 4);
    assert_eq!(count(&doc, "circle", "node"), 2);
    assert_eq!(count(&doc, "text", "node-label"), 2);
    assert_eq!(count(&doc, "text", "edge-label"), 4);

    let labels: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .filter_map(|n| n.text())
        .collect();
    assert!(labels.contains(&"0.50"));
    assert!(labels.contains(&"0.60"));

    // Labelled nodes hide their marker.
    for c in doc.descendants().filter(|n| n.has_tag_name("circle")) {
        assert_eq!(c.attribute("fill-opacity"), Some("0"));
    }
}

#[test]
fn node_markers_show_without_labels() {
    let cfg = PlanConfig {
        node_labels: StyleSpec::Off,
        node_colors: StyleSpec::Uniform("r".to_string()),
        ..Default::default()
    };
    let svg = render_table(&weather(), &cfg, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    assert_eq!(count(&doc, "text", "label"), 0);
    for c in doc.descendants().filter(|n| n.has_tag_name("circle")) {
        assert_eq!(c.attribute("fill-opacity"), Some("1"));
        assert_eq!(c.attribute("fill"), Some("red"));
    }
}

#[test]
fn text_and_ids_are_escaped() {
    let table = WeightTable::from_matrix(["<a&b>", "\"q\""], vec![vec![0.0, 1.0], vec![1.0, 0.0]])
        .unwrap();
    let options = SvgRenderOptions {
        diagram_id: Some("x\"y".to_string()),
        background: None,
        ..Default::default()
    };
    let svg = render_table(&table, &PlanConfig::default(), &options).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    assert_eq!(doc.root_element().attribute("id"), Some("x\"y"));
    assert_eq!(count(&doc, "rect", "background"), 0);
    let names: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name("text"))
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(names, ["<a&b>", "\"q\""]);
}

#[test]
fn self_loops_render_as_polylines() {
    let table = WeightTable::from_matrix(["solo"], vec![vec![1.0]]).unwrap();
    let p = plan(&table, &PlanConfig::default()).unwrap();
    let svg = render_svg(&p, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let path = doc
        .descendants()
        .find(|n| n.has_tag_name("path"))
        .unwrap();
    let d = path.attribute("d").unwrap();
    assert!(d.starts_with('M'));
    assert_eq!(d.matches('L').count(), 49);
    assert_eq!(path.attribute("data-source"), Some("solo"));
}

#[test]
fn loop_sampling_follows_plan_geometry() {
    let table = WeightTable::from_matrix(["solo"], vec![vec![1.0]]).unwrap();
    let mut cfg = PlanConfig::default();
    cfg.geometry.loop_samples = 3;
    let svg = render_table(&table, &cfg, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let d = doc
        .descendants()
        .find(|n| n.has_tag_name("path"))
        .and_then(|n| n.attribute("d"))
        .unwrap();
    assert_eq!(d.matches('M').count(), 1);
    assert_eq!(d.matches('L').count(), 2);

    let style: PlanConfig = serde_json::from_str(r#"{"geometry": {"loopSamples": 7}}"#).unwrap();
    let svg = render_table(&table, &style, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let d = doc
        .descendants()
        .find(|n| n.has_tag_name("path"))
        .and_then(|n| n.attribute("d"))
        .unwrap();
    assert_eq!(d.split_whitespace().count(), 7);
}

#[test]
fn edge_colors_and_widths_are_carried() {
    let cfg = PlanConfig {
        edge_colors: StyleSpec::Keyed(StyleMap::new().with_pair("rainy", "sunny", "g".to_string())),
        ..Default::default()
    };
    let svg = render_table(&weather(), &cfg, &SvgRenderOptions::default()).unwrap();
    let doc = roxmltree::Document::parse(&svg).unwrap();
    let rs = doc
        .descendants()
        .find(|n| n.attribute("data-source") == Some("rainy") && n.attribute("data-target") == Some("sunny"))
        .unwrap();
    assert_eq!(rs.attribute("stroke"), Some("green"));
    assert_eq!(rs.attribute("stroke-width"), Some("2"));
}

#[test]
fn invalid_options_are_rejected() {
    let p = plan(&weather(), &PlanConfig::default()).unwrap();
    let options = SvgRenderOptions {
        size: 0.0,
        ..Default::default()
    };
    let err = render_svg(&p, &options).unwrap_err();
    assert!(matches!(err, Error::InvalidOption { name: "size", .. }), "{err}");

    let err = render_table(
        &weather(),
        &PlanConfig {
            radius: -1.0,
            ..Default::default()
        },
        &SvgRenderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Plan(_)), "{err}");
}
