use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_DATA_PATH: &str = "FOCO_DATA";
pub const ENV_GEOJSON_PATH: &str = "FOCO_GEOJSON";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FocoConfig {
    pub data_path: PathBuf,
    pub geojson_path: PathBuf,
    /// Feature property holding the neighborhood name
    pub name_property: String,
    pub columns: ColumnNames,
    pub map: MapView,
    pub choropleth: ChoroplethStyle,
    pub page: PageText,
}

impl Default for FocoConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data_meu/bairros_mapa.csv"),
            geojson_path: PathBuf::from("data_meu/Limite_de_Bairros.geojson"),
            name_property: "nome".to_string(),
            columns: ColumnNames::default(),
            map: MapView::default(),
            choropleth: ChoroplethStyle::default(),
            page: PageText::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnNames {
    pub name: String,
    pub rank: String,
    pub opportunity_cost: String,
    pub map_factor: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "Bairro".to_string(),
            rank: "Ranking".to_string(),
            opportunity_cost: "CdO".to_string(),
            map_factor: "Fator Mapa".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub scroll_wheel_zoom: bool,
    pub tile_url: String,
    pub tile_attribution: String,
    pub width: u32,
    pub height: u32,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            // Rio de Janeiro
            center: (-22.91798994895881, -43.42464638599411),
            zoom: 10,
            scroll_wheel_zoom: false,
            tile_url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
                .to_string(),
            tile_attribution: "&copy; OpenStreetMap contributors &copy; CARTO".to_string(),
            width: 700,
            height: 450,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChoroplethStyle {
    /// Sequential palette, lightest first. Its length is the number of bins.
    pub palette: Vec<String>,
    pub no_data_color: String,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub highlight: bool,
}

impl Default for ChoroplethStyle {
    fn default() -> Self {
        Self {
            // ColorBrewer Blues, 6 classes
            palette: ["#eff3ff", "#c6dbef", "#9ecae1", "#6baed6", "#3182bd", "#08519c"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            no_data_color: "#000000".to_string(),
            fill_opacity: 0.6,
            line_opacity: 0.8,
            highlight: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PageText {
    pub title: String,
    pub subtitle: String,
    pub filter_label: String,
    pub subheading_prefix: String,
    pub rank_title: String,
    pub cost_title: String,
}

impl Default for PageText {
    fn default() -> Self {
        Self {
            title: "FOCO".to_string(),
            subtitle: "Ferramenta de Otimização do Custo de Oportunidade".to_string(),
            filter_label: "Bairro".to_string(),
            subheading_prefix: "Informações sobre".to_string(),
            rank_title: "Ranking".to_string(),
            cost_title: "Custo de Oportunidade".to_string(),
        }
    }
}

impl FocoConfig {
    /// Reads a RON config file. Missing keys fall back to defaults.
    pub fn from_ron_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        ron::from_str::<FocoConfig>(&text).map_err(|source| ConfigError::Ron {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_ron_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Input paths from `FOCO_DATA` / `FOCO_GEOJSON` override the file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(data) = lookup(ENV_DATA_PATH) {
            self.data_path = PathBuf::from(data);
        }
        if let Some(geojson) = lookup(ENV_GEOJSON_PATH) {
            self.geojson_path = PathBuf::from(geojson);
        }
    }
}
