//! Joins dataset rows onto boundary polygons and builds the choropleth layer.

use crate::config::ChoroplethStyle;
use crate::dataset::NeighborhoodRecord;
use crate::format;
use crate::error::GeometryError;
use crate::geometry::{BoundaryCollection, DisplayLabels, PolygonFeature, normalize_name};
use ahash::AHashMap;
use geo::Contains;
use geojson::{Feature, FeatureCollection, JsonValue};
use log::{debug, warn};

pub const RANK_PROPERTY: &str = "ranking";
pub const COST_PROPERTY: &str = "cdo";
pub const FILL_PROPERTY: &str = "fill_color";

pub const RANK_LABEL_PREFIX: &str = "Ranking: ";
pub const COST_LABEL_PREFIX: &str = "Custo de Oportunidade: ";

/// The last interaction the map widget reported.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClickEvent {
    #[default]
    None,
    /// A feature was clicked; carries its name property as the widget saw it
    Feature(String),
    /// Raw map coordinates, resolved against the polygons
    Point { lat: f64, lon: f64 },
}

/// Rows keyed by name for label lookup. A later row with the same name
/// replaces an earlier one.
pub fn index_by_name(records: &[NeighborhoodRecord]) -> AHashMap<&str, &NeighborhoodRecord> {
    let mut index = AHashMap::with_capacity(records.len());
    for record in records {
        index.insert(record.name.as_str(), record);
    }
    index
}

pub fn labels_for(record: Option<&NeighborhoodRecord>) -> DisplayLabels {
    match record {
        Some(record) => DisplayLabels {
            rank_label: format!("{}{}", RANK_LABEL_PREFIX, format::thousands_int(record.rank)),
            cost_label: format!(
                "{}{}",
                COST_LABEL_PREFIX,
                format::plain(record.opportunity_cost)
            ),
        },
        None => DisplayLabels::default(),
    }
}

/// Equal-width classes over the map factor range, one per palette color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl ColorScale {
    pub fn from_values(values: impl IntoIterator<Item = f64>, palette: &[String]) -> Option<Self> {
        if palette.is_empty() {
            return None;
        }

        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })?;

        Some(Self {
            min,
            max,
            palette: palette.to_vec(),
        })
    }

    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }

        let bins = self.palette.len();
        let span = self.max - self.min;
        if span <= 0.0 {
            return Some(0);
        }

        let position = ((value - self.min) * bins as f64 / span).floor();
        Some((position.max(0.0) as usize).min(bins - 1))
    }

    pub fn color_for(&self, value: f64) -> Option<&str> {
        self.bin_of(value).map(|bin| self.palette[bin].as_str())
    }

    /// Lower and upper edge of every class.
    pub fn breaks(&self) -> Vec<(f64, f64)> {
        let bins = self.palette.len();
        let width = (self.max - self.min) / bins as f64;
        (0..bins)
            .map(|i| {
                let lower = self.min + width * i as f64;
                let upper = if i + 1 == bins { self.max } else { lower + width };
                (lower, upper)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ChoroplethLayer {
    /// Boundaries with name, label and fill color properties, ready for the widget
    pub features: FeatureCollection,
    pub scale: Option<ColorScale>,
    pub style: ChoroplethStyle,
    pub matched: usize,
}

fn attach(polygon: &mut PolygonFeature, labels: DisplayLabels, fill: &str) {
    polygon
        .feature
        .set_property(RANK_PROPERTY, JsonValue::String(labels.rank_label.clone()));
    polygon
        .feature
        .set_property(COST_PROPERTY, JsonValue::String(labels.cost_label.clone()));
    polygon
        .feature
        .set_property(FILL_PROPERTY, JsonValue::String(fill.to_string()));
    polygon.labels = labels;
}

/// Attaches rank/cost labels and fill colors to every polygon.
///
/// Boundaries not yet normalized are normalized first; names are then
/// compared exactly. Polygons without a row get blank labels and the no-data
/// color. The color range covers one factor per name, from the same
/// last-write-wins index the labels use.
pub fn bind_map(
    boundaries: &mut BoundaryCollection,
    records: &[NeighborhoodRecord],
    style: &ChoroplethStyle,
) -> Result<ChoroplethLayer, GeometryError> {
    if !boundaries.is_normalized() {
        boundaries.normalize()?;
    }

    let index = index_by_name(records);
    let scale = ColorScale::from_values(index.values().map(|r| r.map_factor), &style.palette);

    let name_property = boundaries.name_property.clone();
    let mut matched = 0;

    for polygon in boundaries.features.iter_mut() {
        let record = polygon
            .name(&name_property)
            .and_then(|name| index.get(name).copied());

        let fill = record
            .and_then(|r| scale.as_ref().and_then(|s| s.color_for(r.map_factor)))
            .unwrap_or(style.no_data_color.as_str())
            .to_string();

        if record.is_some() {
            matched += 1;
        }

        attach(polygon, labels_for(record), &fill);
    }

    let unmatched = boundaries.features.len() - matched;
    if unmatched > 0 {
        warn!(
            "{} of {} boundaries have no dataset row",
            unmatched,
            boundaries.features.len()
        );
    }
    debug!("Bound {} rows onto {} boundaries", index.len(), matched);

    let features: Vec<Feature> = boundaries
        .features
        .iter()
        .map(|polygon| polygon.feature.clone())
        .collect();

    Ok(ChoroplethLayer {
        features: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        scale,
        style: style.clone(),
        matched,
    })
}

fn contains_point(feature: &Feature, point: &geo::Point<f64>) -> bool {
    let Some(geometry) = feature.geometry.clone() else {
        return false;
    };

    match geo_types::Geometry::<f64>::try_from(geometry) {
        Ok(geo_types::Geometry::Polygon(polygon)) => polygon.contains(point),
        Ok(geo_types::Geometry::MultiPolygon(multi)) => multi.contains(point),
        Ok(_) => false,
        Err(e) => {
            debug!("Skipping unconvertible boundary geometry: {}", e);
            false
        }
    }
}

/// Name of the feature the last click landed on, or empty when it missed.
///
/// A feature without a dataset row is still a valid selection.
pub fn resolve_click(boundaries: &BoundaryCollection, click: &ClickEvent) -> String {
    match click {
        ClickEvent::None => String::new(),
        ClickEvent::Feature(raw) => {
            let mut name = raw.clone();
            normalize_name(&mut name);
            match boundaries.find(&name) {
                Some(_) => name,
                None => String::new(),
            }
        }
        ClickEvent::Point { lat, lon } => {
            let point = geo::Point::new(*lon, *lat);
            boundaries
                .features
                .iter()
                .find(|polygon| contains_point(&polygon.feature, &point))
                .and_then(|polygon| polygon.name(&boundaries.name_property))
                .map(str::to_string)
                .unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{named_feature, record, square_feature};

    fn boundaries(features: Vec<Feature>) -> BoundaryCollection {
        let mut collection = BoundaryCollection::from_features(features, "nome");
        collection.normalize().unwrap();
        collection
    }

    #[test]
    fn trailing_space_polygon_gets_labels() {
        let mut polygons = boundaries(vec![named_feature("Centro ")]);
        let rows = vec![record("Centro", 1234, "10.555", 0.5)];

        let layer = bind_map(&mut polygons, &rows, &ChoroplethStyle::default()).unwrap();

        let labels = &polygons.features[0].labels;
        assert_eq!(labels.rank_label, "Ranking: 1,234");
        assert_eq!(labels.cost_label, "Custo de Oportunidade: 10.56");
        assert_eq!(layer.matched, 1);

        let feature = &layer.features.features[0];
        assert_eq!(feature.property("nome").and_then(JsonValue::as_str), Some("Centro"));
        assert_eq!(
            feature.property(RANK_PROPERTY).and_then(JsonValue::as_str),
            Some("Ranking: 1,234")
        );
    }

    #[test]
    fn unmatched_polygon_gets_blank_labels() {
        let mut polygons = boundaries(vec![named_feature("Centro"), named_feature("Lapa")]);
        let rows = vec![record("Centro", 1, "1", 0.5), record("Bangu", 2, "2", 0.7)];

        let style = ChoroplethStyle::default();
        let layer = bind_map(&mut polygons, &rows, &style).unwrap();

        assert_eq!(polygons.features[1].labels, DisplayLabels::default());
        let lapa = &layer.features.features[1];
        assert_eq!(lapa.property(RANK_PROPERTY).and_then(JsonValue::as_str), Some(""));
        assert_eq!(lapa.property(COST_PROPERTY).and_then(JsonValue::as_str), Some(""));
        assert_eq!(
            lapa.property(FILL_PROPERTY).and_then(JsonValue::as_str),
            Some(style.no_data_color.as_str())
        );
        assert_eq!(layer.matched, 1);
    }

    #[test]
    fn label_lookup_is_last_write_wins() {
        let mut polygons = boundaries(vec![named_feature("Centro")]);
        let rows = vec![record("Centro", 1, "10", 0.1), record("Centro", 2, "20.004", 0.9)];

        bind_map(&mut polygons, &rows, &ChoroplethStyle::default()).unwrap();

        assert_eq!(polygons.features[0].labels.rank_label, "Ranking: 2");
        assert_eq!(
            polygons.features[0].labels.cost_label,
            "Custo de Oportunidade: 20"
        );
    }

    #[test]
    fn color_range_ignores_overwritten_rows() {
        let mut polygons = boundaries(vec![named_feature("Centro"), named_feature("Tijuca")]);
        let rows = vec![
            record("Centro", 1, "1", 0.0),
            record("Centro", 1, "1", 1.0),
            record("Tijuca", 2, "2", 0.5),
        ];

        let style = ChoroplethStyle::default();
        let layer = bind_map(&mut polygons, &rows, &style).unwrap();

        let scale = layer.scale.as_ref().unwrap();
        assert_eq!(scale.min, 0.5);
        assert_eq!(scale.max, 1.0);

        let fill = |i: usize| {
            layer.features.features[i]
                .property(FILL_PROPERTY)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };
        assert_eq!(fill(0), style.palette.last().cloned());
        assert_eq!(fill(1), style.palette.first().cloned());
    }

    #[test]
    fn binds_unnormalized_boundaries() {
        let mut polygons =
            BoundaryCollection::from_features(vec![named_feature("Centro  ")], "nome");
        let rows = vec![record("Centro", 7, "3.5", 0.5)];

        bind_map(&mut polygons, &rows, &ChoroplethStyle::default()).unwrap();

        assert!(polygons.is_normalized());
        assert_eq!(polygons.features[0].labels.rank_label, "Ranking: 7");
        assert_eq!(
            polygons.features[0].labels.cost_label,
            "Custo de Oportunidade: 3.5"
        );
    }

    #[test]
    fn binding_unnamed_boundary_fails() {
        let mut unnamed = named_feature("x");
        unnamed.remove_property("nome");
        let mut polygons = BoundaryCollection::from_features(vec![unnamed], "nome");

        let err = bind_map(&mut polygons, &[], &ChoroplethStyle::default()).unwrap_err();
        assert!(matches!(err, GeometryError::MissingName { index: 0, .. }));
    }

    #[test]
    fn color_scale_bins() {
        let palette: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let scale = ColorScale::from_values([0.0, 3.0, f64::NAN], &palette).unwrap();

        assert_eq!(scale.color_for(0.0), Some("a"));
        assert_eq!(scale.color_for(0.99), Some("a"));
        assert_eq!(scale.color_for(1.0), Some("b"));
        assert_eq!(scale.color_for(2.5), Some("c"));
        assert_eq!(scale.color_for(3.0), Some("c"));
        assert_eq!(scale.color_for(f64::NAN), None);
        assert_eq!(scale.breaks(), vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);

        let flat = ColorScale::from_values([2.0, 2.0], &palette).unwrap();
        assert_eq!(flat.color_for(2.0), Some("a"));

        assert!(ColorScale::from_values(std::iter::empty(), &palette).is_none());
        assert!(ColorScale::from_values([1.0], &[]).is_none());
    }

    #[test]
    fn fills_follow_map_factor() {
        let mut polygons = boundaries(vec![named_feature("Low"), named_feature("High")]);
        let rows = vec![record("Low", 1, "1", 0.0), record("High", 2, "2", 1.0)];

        let style = ChoroplethStyle::default();
        let layer = bind_map(&mut polygons, &rows, &style).unwrap();

        let fill = |i: usize| {
            layer.features.features[i]
                .property(FILL_PROPERTY)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };
        assert_eq!(fill(0), style.palette.first().cloned());
        assert_eq!(fill(1), style.palette.last().cloned());
    }

    #[test]
    fn click_on_feature_resolves_name() {
        let polygons = boundaries(vec![named_feature("Centro  "), named_feature("Lapa")]);

        assert_eq!(resolve_click(&polygons, &ClickEvent::None), "");
        assert_eq!(
            resolve_click(&polygons, &ClickEvent::Feature("Centro  ".to_string())),
            "Centro"
        );
        // no dataset row needed
        assert_eq!(
            resolve_click(&polygons, &ClickEvent::Feature("Lapa".to_string())),
            "Lapa"
        );
        assert_eq!(
            resolve_click(&polygons, &ClickEvent::Feature("Marte".to_string())),
            ""
        );
    }

    #[test]
    fn click_on_point_uses_containment() {
        let polygons = boundaries(vec![
            square_feature("West", 0.0, 0.0),
            square_feature("East", 2.0, 0.0),
        ]);

        let at = |lon: f64, lat: f64| resolve_click(&polygons, &ClickEvent::Point { lat, lon });

        assert_eq!(at(0.5, 0.5), "West");
        assert_eq!(at(2.5, 0.5), "East");
        assert_eq!(at(1.5, 0.5), "");
        assert_eq!(at(0.5, 5.0), "");
    }
}
