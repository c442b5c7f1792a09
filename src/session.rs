//! One render cycle: load, normalize, bind, resolve the selection, aggregate.
//!
//! Every cycle owns fresh copies of the dataset and the boundaries; nothing
//! is shared between cycles.

use crate::aggregate::NeighborhoodSummary;
use crate::binder::{ClickEvent, bind_map, resolve_click};
use crate::config::FocoConfig;
use crate::dataset::Dataset;
use crate::error::LoadError;
use crate::geometry::BoundaryCollection;
use crate::page::{PageModel, render_page};
use crate::selection::{Selection, candidate_names, coordinate};
use log::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderRequest {
    pub click: ClickEvent,
    /// Set only when the dropdown was changed for this render
    pub dropdown: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Name the map click resolved to
    pub click: String,
    pub selection: Selection,
    pub summary: NeighborhoodSummary,
    pub html: String,
}

pub struct Session {
    pub dataset: Dataset,
    pub boundaries: BoundaryCollection,
}

impl Session {
    pub fn load(config: &FocoConfig) -> Result<Self, LoadError> {
        let dataset = Dataset::load(&config.data_path, &config.columns)?;
        let boundaries = BoundaryCollection::load(&config.geojson_path, &config.name_property)?;
        Self::new(dataset, boundaries)
    }

    /// Normalizes the boundary names once, before anything joins on them.
    pub fn new(dataset: Dataset, mut boundaries: BoundaryCollection) -> Result<Self, LoadError> {
        if !boundaries.is_normalized() {
            boundaries.normalize()?;
        }

        Ok(Self {
            dataset,
            boundaries,
        })
    }

    pub fn render(
        mut self,
        config: &FocoConfig,
        request: &RenderRequest,
    ) -> Result<RenderedPage, LoadError> {
        let records = &self.dataset.records;

        let layer = bind_map(&mut self.boundaries, records, &config.choropleth)?;
        let click = resolve_click(&self.boundaries, &request.click);

        let candidates = candidate_names(records);
        let selection = coordinate(&candidates, &click, request.dropdown.as_deref());

        debug!(
            "Render: click {:?} -> {:?}, dropdown {:?} -> selection {:?}",
            request.click, click, request.dropdown, selection.name
        );

        let summary = NeighborhoodSummary::compute(records, &selection.name);

        let html = render_page(&PageModel {
            text: &config.page,
            map: &config.map,
            layer: &layer,
            name_property: &self.boundaries.name_property,
            candidates: &candidates,
            selection: &selection,
            click: &click,
            summary: &summary,
        });

        Ok(RenderedPage {
            click,
            selection,
            summary,
            html,
        })
    }
}

/// Loads the inputs named by `config` and renders one page.
pub fn render_cycle(
    config: &FocoConfig,
    request: &RenderRequest,
) -> Result<RenderedPage, LoadError> {
    Session::load(config)?.render(config, request)
}
