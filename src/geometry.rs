//! Neighborhood boundary polygons and the name normalization they need before
//! they can be joined against the dataset.

use crate::error::{GeometryError, LoadError, io_err};
use geojson::{Feature, FeatureCollection, GeoJson, JsonValue};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Display strings attached to a polygon by the map binder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLabels {
    pub rank_label: String,
    pub cost_label: String,
}

#[derive(Debug, Clone)]
pub struct PolygonFeature {
    pub feature: Feature,
    pub labels: DisplayLabels,
}

impl PolygonFeature {
    pub fn name<'a>(&'a self, name_property: &str) -> Option<&'a str> {
        self.feature.property(name_property).and_then(JsonValue::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryCollection {
    pub name_property: String,
    pub features: Vec<PolygonFeature>,
    normalized: bool,
}

/// Removes trailing U+0020 characters. Tabs and other whitespace stay.
pub fn normalize_name(name: &mut String) {
    while name.ends_with(' ') {
        name.pop();
    }
}

impl BoundaryCollection {
    pub fn from_features(features: Vec<Feature>, name_property: &str) -> Self {
        Self {
            name_property: name_property.to_string(),
            features: features
                .into_iter()
                .map(|feature| PolygonFeature {
                    feature,
                    labels: DisplayLabels::default(),
                })
                .collect(),
            normalized: false,
        }
    }

    pub fn load(path: &Path, name_property: &str) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|e| io_err!(path, e))?;
        let collection = Self::from_reader(BufReader::new(file), name_property, path)?;

        info!(
            "Loaded {} boundary features from {}",
            collection.features.len(),
            path.display()
        );

        Ok(collection)
    }

    /// `path` only labels errors.
    pub fn from_reader<R: Read>(
        reader: R,
        name_property: &str,
        path: &Path,
    ) -> Result<Self, LoadError> {
        let geojson = GeoJson::from_reader(reader).map_err(|source| LoadError::GeoJson {
            path: path.to_path_buf(),
            source: Box::new(geojson::Error::MalformedJson(source)),
        })?;

        match geojson {
            GeoJson::FeatureCollection(FeatureCollection { features, .. }) => {
                Ok(Self::from_features(features, name_property))
            }
            _ => Err(LoadError::NotFeatureCollection {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Strips trailing spaces from every feature's name property in place.
    ///
    /// A feature without a string name property is rejected; nothing else can
    /// fail. Applying it twice changes nothing.
    pub fn normalize(&mut self) -> Result<(), GeometryError> {
        let mut changed = 0;

        for (index, polygon) in self.features.iter_mut().enumerate() {
            let mut name = match polygon.feature.property(&self.name_property) {
                Some(JsonValue::String(name)) => name.clone(),
                _ => {
                    return Err(GeometryError::MissingName {
                        index,
                        property: self.name_property.clone(),
                    });
                }
            };

            let before = name.len();
            normalize_name(&mut name);

            if name.len() != before {
                changed += 1;
                polygon
                    .feature
                    .set_property(self.name_property.clone(), JsonValue::String(name));
            }
        }

        debug!("Normalized {} boundary names", changed);

        self.normalized = true;
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter_map(move |polygon| polygon.name(&self.name_property))
    }

    pub fn find(&self, name: &str) -> Option<&PolygonFeature> {
        self.features
            .iter()
            .find(|polygon| polygon.name(&self.name_property) == Some(name))
    }
}
