//! Generate an HTML/SVG visualization of the ISO60 keymap.
//!
//! Keys are drawn on a standard row-staggered ISO 60% plate. Each layer
//! shows what a key actually does on that layer: overlay keys are labelled
//! with the injected modifier, action keys with their action.

use iso60_keymap::wiring::{matrix_position, PhysKey, PHYS_ROWS, PHYS_ROW_LEN};
use iso60_keymap::{Action, Keycode, Keymap, Resolved, NUM_LAYERS};

/// Key unit size in SVG pixels.
const U: f64 = 54.0;
/// Gap between keys.
const GAP: f64 = 4.0;
/// Key corner radius.
const R: f64 = 4.0;
/// Margin around the SVG content.
const MARGIN: f64 = 20.0;
/// Plate width in units.
const PLATE_U: f64 = 15.0;

/// Key widths in units, per physical row. The last key of row 1 is the ISO
/// Enter, which also covers the end of row 2.
const WIDTHS: [&[f64]; PHYS_ROWS] = [
    &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0],
    &[1.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.5],
    &[1.75, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    &[1.25, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.75],
    &[1.5, 1.5, 7.0, 1.5, 1.5],
];

/// Left offset of each physical row in units.
const ROW_OFFSET: [f64; PHYS_ROWS] = [0.0, 0.0, 0.0, 0.0, 1.0];

const LAYER_TITLES: [&str; NUM_LAYERS] = ["Layer 0 (Base)", "Layer 1 (Gui)", "Layer 2 (AltGr)"];

/// Physical key position for SVG rendering.
struct Key {
    x: f64,
    y: f64,
    w: f64,
    iso_enter: bool,
    row: usize,
    col: usize,
}

/// Build all physical key positions, in units.
fn build_keys() -> Vec<Key> {
    let mut keys = Vec::new();
    for (prow, widths) in WIDTHS.iter().enumerate() {
        debug_assert_eq!(widths.len(), PHYS_ROW_LEN[prow]);
        let mut x = ROW_OFFSET[prow];
        for (pcol, &w) in widths.iter().enumerate() {
            let phys = PhysKey {
                row: prow as u8,
                col: pcol as u8,
            };
            if let Some((row, col)) = matrix_position(phys) {
                keys.push(Key {
                    x,
                    y: prow as f64,
                    w,
                    iso_enter: prow == 1 && pcol == widths.len() - 1,
                    row,
                    col,
                });
            }
            x += w;
        }
    }
    keys
}

/// Label and CSS class for a key on a layer.
fn describe(keymap: &Keymap, layer: usize, row: usize, col: usize) -> (String, &'static str) {
    match keymap.resolve(layer, row, col) {
        Resolved::Overlay { mods, key } => (
            format!("{}+{}", mods.display_name(), key.display_name()),
            "key overlay",
        ),
        Resolved::Key(Keycode::Trans) => (String::new(), "key transparent"),
        Resolved::Key(Keycode::No) => (String::new(), "key unused"),
        Resolved::Key(keycode) => match keymap.action_for(keycode) {
            Some(action) => (describe_action(action), "key action"),
            None if keycode.is_modifier() => (keycode.display_name().to_string(), "key modifier"),
            None => (keycode.display_name().to_string(), "key"),
        },
    }
}

fn describe_action(action: Action) -> String {
    match action {
        Action::ModsKey(mods, key) => format!("{}+{}", mods.display_name(), key.display_name()),
        Action::LayerTapKey(layer, key) => format!("{}/L{}", key.display_name(), layer),
        Action::LayerMomentary(layer) => format!("L{}", layer),
        Action::LayerToggle(layer) => format!("TG{}", layer),
    }
}

/// SVG outline of a key, in pixels.
fn outline(key: &Key, class: &str) -> String {
    let x = key.x * U;
    let y = key.y * U;
    let w = key.w * U - GAP;
    if !key.iso_enter {
        return format!(r#"<rect x="{x}" y="{y}" width="{w}" height="{}" rx="{R}" class="{class}"/>"#, U - GAP);
    }

    // ISO Enter: 1.5u on the top row, 1.25u on the row below.
    let notch = 0.25 * U;
    let bottom = y + 2.0 * U - GAP;
    let mid = y + U - GAP;
    format!(
        r#"<path d="M{x},{y} H{} V{bottom} H{} V{mid} H{x} Z" class="{class}"/>"#,
        x + w,
        x + notch,
    )
}

/// Render a single layer as an SVG group.
fn render_layer(keymap: &Keymap, keys: &[Key], layer: usize, y_offset: f64) -> String {
    let mut svg = format!(r#"<g transform="translate({MARGIN}, {y_offset})">"#);
    svg.push_str(&format!(
        r#"<text x="0" y="-10" class="layer-title">{}</text>"#,
        LAYER_TITLES[layer]
    ));

    for key in keys {
        let (label, class) = describe(keymap, layer, key.row, key.col);
        svg.push_str(&outline(key, class));

        if !label.is_empty() {
            let font_class = if label.chars().count() > 4 { " small" } else { "" };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" class="label{font_class}">{}</text>"#,
                key.x * U + (key.w * U - GAP) / 2.0,
                key.y * U + (U - GAP) / 2.0 + 1.0,
                html_escape(&label),
            ));
        }
    }

    svg.push_str("</g>");
    svg
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Generate the complete HTML document with inline SVG.
pub fn generate_html(keymap: &Keymap) -> String {
    let keys = build_keys();
    let layer_height = PHYS_ROWS as f64 * U + 60.0;
    let total_width = PLATE_U * U + 2.0 * MARGIN;
    let total_height = keymap.layers.len() as f64 * layer_height + 2.0 * MARGIN;

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ISO60 Layout</title>
<style>
  body {{
    background: #f4f1ea;
    color: #222;
    font-family: system-ui, -apple-system, sans-serif;
    display: flex;
    justify-content: center;
    padding: 2em;
  }}
  .key {{ fill: #fffdf8; stroke: #8a8373; stroke-width: 1.5; }}
  .key.unused {{ fill: #e6e2d8; stroke: #c9c3b5; stroke-dasharray: 3 3; }}
  .key.transparent {{ fill: #f4f1ea; stroke: #c9c3b5; stroke-dasharray: 2 2; }}
  .key.overlay {{ fill: #e7eef7; stroke: #4a6fa5; }}
  .key.action {{ fill: #f7e7e7; stroke: #a54a4a; stroke-width: 2; }}
  .key.modifier {{ fill: #ebe7f7; stroke: #6a4aa5; }}
  .label {{
    fill: #222;
    font-family: "JetBrains Mono", "Fira Code", monospace;
    font-size: 13px;
    text-anchor: middle;
    dominant-baseline: middle;
    pointer-events: none;
  }}
  .label.small {{ font-size: 9px; }}
  .layer-title {{ font-size: 16px; font-weight: bold; fill: #4a6fa5; }}
</style>
</head>
<body>
<svg width="{total_width}" height="{total_height}" xmlns="http://www.w3.org/2000/svg">
"#
    );

    for layer in 0..keymap.layers.len().min(NUM_LAYERS) {
        let y_offset = MARGIN + layer as f64 * layer_height + 30.0;
        html.push_str(&render_layer(keymap, &keys, layer, y_offset));
        html.push('\n');
    }

    html.push_str("</svg>\n</body>\n</html>\n");
    html
}
