//! Reconciles the map click with the neighborhood dropdown.

use crate::dataset::NeighborhoodRecord;
use itertools::Itertools;

/// The active dropdown entry. An empty name means every neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub index: usize,
    pub name: String,
}

impl Selection {
    pub fn is_all(&self) -> bool {
        self.name.is_empty()
    }
}

/// The empty option followed by every distinct name, ascending.
pub fn candidate_names(records: &[NeighborhoodRecord]) -> Vec<String> {
    std::iter::once(String::new())
        .chain(records.iter().map(|record| record.name.clone()).unique())
        .sorted()
        .collect()
}

/// `prior` when it is one of the candidates, the empty option otherwise.
pub fn resolve_selection(candidates: &[String], prior: &str) -> Selection {
    let found = match prior.is_empty() {
        true => None,
        false => candidates.iter().position(|candidate| candidate == prior),
    };

    match found {
        Some(index) => Selection {
            index,
            name: prior.to_string(),
        },
        None => Selection::default(),
    }
}

/// One render's selection.
///
/// `dropdown` is only set when the user changed the dropdown in this render;
/// it then wins. Otherwise the dropdown is reseeded from the map click, so a
/// click that hits no feature resets it to the empty option and the earlier
/// manual choice is gone.
pub fn coordinate(candidates: &[String], click: &str, dropdown: Option<&str>) -> Selection {
    match dropdown {
        Some(choice) => resolve_selection(candidates, choice),
        None => resolve_selection(candidates, click),
    }
}
