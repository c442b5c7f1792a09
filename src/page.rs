//! The interactive page: map widget, dropdown and the two metric widgets.
//!
//! The map itself is drawn client side by Leaflet. Clicks navigate back to the
//! page with `clicked` (feature name) or `lat`/`lon` (anywhere else) so the
//! next render can resolve them; the dropdown submits `bairro` alongside the
//! click it was seeded from.

use crate::aggregate::NeighborhoodSummary;
use crate::binder::{COST_PROPERTY, ChoroplethLayer, FILL_PROPERTY, RANK_PROPERTY};
use crate::config::{MapView, PageText};
use crate::format;
use crate::selection::Selection;
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::error;
use serde::Serialize;

pub struct PageModel<'a> {
    pub text: &'a PageText,
    pub map: &'a MapView,
    pub layer: &'a ChoroplethLayer,
    pub name_property: &'a str,
    pub candidates: &'a [String],
    pub selection: &'a Selection,
    /// Name resolved from the last map click, carried by the dropdown form
    pub click: &'a str,
    pub summary: &'a NeighborhoodSummary,
}

/// JSON safe to place inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            error!("Failed to serialize map data: {}", e);
            "null".to_string()
        }
    }
}

pub fn render_page(model: &PageModel) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>{css}</style>
</head>
<body>
    <aside class="sidebar">
        {filter}
    </aside>
    <main>
        <h1>{title}</h1>
        <p class="caption">{subtitle}</p>
        <div id="map" style="width: {width}px; height: {height}px;"></div>
        {legend}
        <h2>{subheading}</h2>
        <div class="columns">
            {rank_metric}
            {cost_metric}
        </div>
    </main>
    <script>{js}</script>
</body>
</html>"#,
        title = encode_text(&model.text.title),
        subtitle = encode_text(&model.text.subtitle),
        css = inline_css(),
        filter = render_filter(model),
        width = model.map.width,
        height = model.map.height,
        legend = render_legend(model.layer),
        subheading = encode_text(&format!(
            "{} {}",
            model.text.subheading_prefix, model.summary.selection
        )),
        rank_metric = render_metric(&model.text.rank_title, &format::thousands(model.summary.rank)),
        cost_metric = render_metric(
            &model.text.cost_title,
            &format::thousands(model.summary.opportunity_cost)
        ),
        js = render_map_script(model),
    )
}

fn render_filter(model: &PageModel) -> String {
    let options: String = model
        .candidates
        .iter()
        .enumerate()
        .map(|(i, name)| {
            format!(
                r#"<option value="{value}"{selected}>{label}</option>"#,
                value = encode_double_quoted_attribute(name),
                selected = if i == model.selection.index { " selected" } else { "" },
                label = encode_text(name),
            )
        })
        .collect();

    format!(
        r#"<form method="get">
            <label for="bairro">{label}</label>
            <input type="hidden" name="clicked" value="{click}">
            <select id="bairro" name="bairro" onchange="this.form.submit()">{options}</select>
            <noscript><button type="submit">OK</button></noscript>
        </form>"#,
        label = encode_text(&model.text.filter_label),
        click = encode_double_quoted_attribute(model.click),
        options = options,
    )
}

fn render_metric(title: &str, value: &str) -> String {
    format!(
        r#"<div class="metric"><div class="metric-label">{}</div><div class="metric-value">{}</div></div>"#,
        encode_text(title),
        encode_text(value)
    )
}

fn render_legend(layer: &ChoroplethLayer) -> String {
    let Some(scale) = &layer.scale else {
        return String::new();
    };

    let entries: String = scale
        .breaks()
        .iter()
        .zip(&scale.palette)
        .map(|((lower, upper), color)| {
            format!(
                r#"<span class="legend-entry"><i style="background: {}"></i>{:.2} - {:.2}</span>"#,
                encode_double_quoted_attribute(color),
                lower,
                upper
            )
        })
        .collect();

    format!(r#"<div class="legend">{}</div>"#, entries)
}

fn render_map_script(model: &PageModel) -> String {
    let map = model.map;
    let style = &model.layer.style;

    format!(
        r#"
const data = {data};
const nameProperty = {name_property};
const map = L.map('map', {{ scrollWheelZoom: {scroll} }}).setView([{lat}, {lon}], {zoom});
L.tileLayer({tile_url}, {{ attribution: {attribution} }}).addTo(map);

function go(params) {{
    window.location.search = new URLSearchParams(params).toString();
}}

function baseStyle(feature) {{
    return {{
        fillColor: feature.properties[{fill}],
        fillOpacity: {fill_opacity},
        color: 'black',
        weight: 1,
        opacity: {line_opacity},
    }};
}}

function tooltip(feature) {{
    const box = document.createElement('div');
    for (const key of [nameProperty, {rank}, {cost}]) {{
        const line = document.createElement('div');
        line.textContent = feature.properties[key] || '';
        box.appendChild(line);
    }}
    return box;
}}

const layer = L.geoJSON(data, {{
    style: baseStyle,
    onEachFeature: (feature, polygon) => {{
        polygon.bindTooltip(tooltip(feature), {{ sticky: true }});
        if ({highlight}) {{
            polygon.on('mouseover', () => polygon.setStyle({{ weight: 3, fillOpacity: 0.9 }}));
            polygon.on('mouseout', () => layer.resetStyle(polygon));
        }}
        polygon.on('click', (event) => {{
            L.DomEvent.stopPropagation(event);
            go({{ clicked: feature.properties[nameProperty] }});
        }});
    }},
}}).addTo(map);

map.on('click', (event) => go({{ lat: event.latlng.lat, lon: event.latlng.lng }}));
"#,
        data = script_json(&model.layer.features),
        name_property = script_json(model.name_property),
        scroll = map.scroll_wheel_zoom,
        lat = map.center.0,
        lon = map.center.1,
        zoom = map.zoom,
        tile_url = script_json(&map.tile_url),
        attribution = script_json(&map.tile_attribution),
        fill = script_json(FILL_PROPERTY),
        fill_opacity = style.fill_opacity,
        line_opacity = style.line_opacity,
        rank = script_json(RANK_PROPERTY),
        cost = script_json(COST_PROPERTY),
        highlight = style.highlight,
    )
}

fn inline_css() -> &'static str {
    r#"
body { margin: 0; display: flex; font-family: "Source Sans Pro", sans-serif; color: #31333f; }
.sidebar { width: 18rem; min-height: 100vh; padding: 2rem 1rem; background: #f0f2f6; box-sizing: border-box; }
.sidebar label { display: block; font-size: 0.9rem; margin-bottom: 0.4rem; }
.sidebar select { width: 100%; padding: 0.4rem; }
main { padding: 2rem 3rem; }
.caption { color: #808495; margin-top: -0.5rem; }
.legend { margin-top: 0.5rem; font-size: 0.8rem; }
.legend-entry { margin-right: 0.8rem; }
.legend-entry i { display: inline-block; width: 0.8rem; height: 0.8rem; margin-right: 0.3rem; }
.columns { display: flex; gap: 2rem; }
.metric { flex: 1; }
.metric-label { font-size: 0.9rem; }
.metric-value { font-size: 2.2rem; }
"#
}
