use foco::binder::ClickEvent;
use foco::geometry::BoundaryCollection;
use foco::{FocoConfig, LoadError, RenderRequest, render_cycle};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> FocoConfig {
    FocoConfig {
        data_path: fixtures().join("bairros_mapa.csv"),
        geojson_path: fixtures().join("Limite_de_Bairros.geojson"),
        ..FocoConfig::default()
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn overview_without_selection() {
    let page = render_cycle(&config(), &RenderRequest::default()).unwrap();

    assert!(page.selection.is_all());
    // duplicate Centro row collapses: 1 + 2 + 1200 + 1300 + 7
    assert_eq!(page.summary.rank, d("2510"));
    // (10.555 + 20 + 3450.125 + 3450.135 + 1.5) / 5 = 1386.463
    assert_eq!(page.summary.opportunity_cost, d("1386.46"));

    assert!(page.html.contains(r#"<div class="metric-value">2,510</div>"#));
    assert!(page.html.contains(r#"<div class="metric-value">1,386.46</div>"#));
    assert!(page.html.contains("<h2>Informações sobre </h2>"));
}

#[test]
fn clicking_a_polygon_selects_it() {
    let request = RenderRequest {
        // inside Bangu's multipolygon
        click: ClickEvent::Point {
            lat: -22.87,
            lon: -43.47,
        },
        dropdown: None,
    };
    let page = render_cycle(&config(), &request).unwrap();

    assert_eq!(page.click, "Bangu");
    assert_eq!(page.selection.name, "Bangu");
    assert_eq!(page.summary.rank, d("2500"));
    assert_eq!(page.summary.opportunity_cost, d("3450.13"));

    // tooltip labels use the last Bangu row
    assert!(page.html.contains("Ranking: 1,300"));
    assert!(page.html.contains("Custo de Oportunidade: 3450.14"));
}

#[test]
fn trailing_space_polygons_join() {
    let page = render_cycle(&config(), &RenderRequest::default()).unwrap();
    assert!(page.html.contains("Custo de Oportunidade: 10.56"));
    assert!(page.html.contains(r#""nome":"Centro""#));
}

#[test]
fn click_off_every_polygon_resets_dropdown() {
    let manual = RenderRequest {
        click: ClickEvent::None,
        dropdown: Some("Tijuca".to_string()),
    };
    let page = render_cycle(&config(), &manual).unwrap();
    assert_eq!(page.selection.name, "Tijuca");

    let ocean = RenderRequest {
        click: ClickEvent::Point {
            lat: -23.10,
            lon: -43.30,
        },
        dropdown: None,
    };
    let page = render_cycle(&config(), &ocean).unwrap();
    assert_eq!(page.click, "");
    assert!(page.selection.is_all());
}

#[test]
fn boundaries_keep_their_other_properties() {
    let mut boundaries = BoundaryCollection::load(
        &fixtures().join("Limite_de_Bairros.geojson"),
        "nome",
    )
    .unwrap();
    boundaries.normalize().unwrap();

    assert_eq!(
        boundaries.names().collect::<Vec<_>>(),
        vec!["Centro", "Tijuca", "Bangu", "Lapa"]
    );
    let bangu = boundaries.find("Bangu").unwrap();
    assert_eq!(
        bangu.feature.property("codbairro").and_then(|v| v.as_str()),
        Some("141")
    );
}

#[test]
fn missing_geojson_aborts_render() {
    let broken = FocoConfig {
        geojson_path: fixtures().join("missing.geojson"),
        ..config()
    };

    let err = render_cycle(&broken, &RenderRequest::default()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}
