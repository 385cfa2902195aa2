//! Fetch-once cache of municipalities and the views derived from it.

use std::{collections::HashSet, sync::Arc};

use shared::domain::{Municipality, MunicipalityId, Region, RegionId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{collation::sort_by_name, TaxApi};

#[derive(Debug, Clone, Default)]
pub struct MunicipalityState {
    pub municipalities: Arc<Vec<Municipality>>,
    pub selected_region_id: Option<RegionId>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_fetched: bool,
}

impl MunicipalityState {
    fn is_populated(&self) -> bool {
        self.has_fetched && !self.municipalities.is_empty()
    }

    /// One entry per region id (first occurrence wins), sorted by name.
    pub fn regions(&self) -> Vec<Region> {
        let mut seen = HashSet::new();
        let mut regions: Vec<Region> = self
            .municipalities
            .iter()
            .filter(|m| seen.insert(m.region.id.clone()))
            .map(|m| m.region.clone())
            .collect();
        sort_by_name(&mut regions, |r| r.name.as_str());
        regions
    }

    pub fn filtered_municipalities(&self) -> Vec<Municipality> {
        let mut filtered: Vec<Municipality> = match &self.selected_region_id {
            Some(region_id) => self
                .municipalities
                .iter()
                .filter(|m| &m.region.id == region_id)
                .cloned()
                .collect(),
            None => self.municipalities.to_vec(),
        };
        sort_by_name(&mut filtered, |m| m.name.as_str());
        filtered
    }

    pub fn sorted_municipalities(&self) -> Vec<Municipality> {
        let mut sorted = self.municipalities.to_vec();
        sort_by_name(&mut sorted, |m| m.name.as_str());
        sorted
    }

    pub fn municipality_by_id(&self, id: &MunicipalityId) -> Option<&Municipality> {
        self.municipalities.iter().find(|m| &m.id == id)
    }

    /// Looks a municipality up by id, falling back to its official code
    /// (e.g. `0180` for Stockholm).
    pub fn municipality_by_id_or_code(&self, key: &str) -> Option<&Municipality> {
        let key = key.trim();
        self.municipalities
            .iter()
            .find(|m| m.id.as_str() == key)
            .or_else(|| self.municipalities.iter().find(|m| m.code == key))
    }
}

/// Process-wide reference data. Construct once at startup and share it via
/// `Arc`; the collection is only ever replaced by [`Self::fetch_municipalities`].
pub struct MunicipalityStore {
    api: Arc<dyn TaxApi>,
    state: watch::Sender<MunicipalityState>,
}

impl MunicipalityStore {
    pub fn new(api: Arc<dyn TaxApi>) -> Self {
        let (state, _) = watch::channel(MunicipalityState::default());
        Self { api, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<MunicipalityState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> MunicipalityState {
        self.state.borrow().clone()
    }

    /// Loads municipalities unless a non-empty collection is already cached.
    /// Failures are recorded in [`MunicipalityState::error`] and leave
    /// `has_fetched` false so a later call retries. Overlapping calls are not
    /// coalesced.
    pub async fn fetch_municipalities(&self) {
        if self.state.borrow().is_populated() {
            debug!("municipalities already cached");
            return;
        }

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let outcome = self.api.list_municipalities().await;

        self.state.send_modify(|state| {
            state.loading = false;
            match outcome {
                Ok(municipalities) => {
                    info!(count = municipalities.len(), "municipalities loaded");
                    state.municipalities = Arc::new(municipalities);
                    state.has_fetched = true;
                }
                Err(err) => {
                    warn!(error = %err, "failed to load municipalities");
                    state.error = Some(err.municipality_load_message());
                }
            }
        });
    }

    pub fn set_selected_region(&self, region_id: Option<RegionId>) {
        self.state.send_modify(|state| state.selected_region_id = region_id);
    }

    pub fn municipality_by_id(&self, id: &MunicipalityId) -> Option<Municipality> {
        self.state.borrow().municipality_by_id(id).cloned()
    }

    pub fn regions(&self) -> Vec<Region> {
        self.state.borrow().regions()
    }

    pub fn filtered_municipalities(&self) -> Vec<Municipality> {
        self.state.borrow().filtered_municipalities()
    }

    pub fn sorted_municipalities(&self) -> Vec<Municipality> {
        self.state.borrow().sorted_municipalities()
    }

    pub fn has_fetched(&self) -> bool {
        self.state.borrow().has_fetched
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }
}

#[cfg(test)]
#[path = "tests/municipalities_tests.rs"]
mod tests;
