use super::*;

use async_trait::async_trait;
use shared::{
    error::{ServiceErrorBody, ServiceException},
    protocol::{TaxRequest, TaxResult},
};
use tokio::sync::Mutex;

use crate::{error::MUNICIPALITIES_UNAVAILABLE, ApiClientError};

fn region(id: &str, name: &str) -> Region {
    Region {
        id: RegionId::new(id),
        code: id.to_uppercase(),
        name: name.into(),
        created_at: None,
        updated_at: None,
    }
}

fn municipality(id: &str, name: &str, region: &Region) -> Municipality {
    Municipality {
        id: MunicipalityId::new(id),
        code: id.into(),
        name: name.into(),
        region: region.clone(),
        municipal_tax_rate: Some(0.2),
        created_at: None,
        updated_at: None,
    }
}

fn sample_municipalities() -> Vec<Municipality> {
    let stockholm = region("r1", "Stockholm");
    let skane = region("r2", "Skåne");
    let orebro_lan = region("r3", "Örebro län");
    vec![
        municipality("1880", "Örebro", &orebro_lan),
        municipality("0180", "Stockholm", &stockholm),
        municipality("1280", "Malmö", &skane),
        municipality("0186", "Lidingö", &stockholm),
        municipality("1282", "Landskrona", &skane),
    ]
}

/// Serves queued responses for the municipality endpoint and counts calls.
struct ScriptedReferenceApi {
    responses: Mutex<Vec<Result<Vec<Municipality>, ApiClientError>>>,
    calls: Mutex<u32>,
}

impl ScriptedReferenceApi {
    fn new(responses: Vec<Result<Vec<Municipality>, ApiClientError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(0),
        })
    }

    async fn calls(&self) -> u32 {
        *self.calls.lock().await
    }
}

#[async_trait]
impl TaxApi for ScriptedReferenceApi {
    async fn calculate(&self, _request: &TaxRequest) -> Result<TaxResult, ApiClientError> {
        Err(ServiceException::new(501, ServiceErrorBody::default()).into())
    }

    async fn list_municipalities(&self) -> Result<Vec<Municipality>, ApiClientError> {
        *self.calls.lock().await += 1;
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Ok(Vec::new());
        }
        responses.remove(0)
    }

    async fn list_regions(&self) -> Result<Vec<Region>, ApiClientError> {
        Ok(Vec::new())
    }
}

fn unavailable() -> ApiClientError {
    ServiceException::new(503, ServiceErrorBody::default()).into()
}

fn names(municipalities: &[Municipality]) -> Vec<&str> {
    municipalities.iter().map(|m| m.name.as_str()).collect()
}

#[tokio::test]
async fn second_fetch_after_success_is_a_no_op() {
    let api = ScriptedReferenceApi::new(vec![Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api.clone());

    store.fetch_municipalities().await;
    store.fetch_municipalities().await;

    assert_eq!(api.calls().await, 1);
    assert!(store.has_fetched());
    assert!(!store.loading());
    assert_eq!(store.snapshot().municipalities.len(), 5);
}

#[tokio::test]
async fn failed_fetch_is_retried_on_next_call() {
    let api = ScriptedReferenceApi::new(vec![Err(unavailable()), Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api.clone());

    store.fetch_municipalities().await;
    assert!(!store.has_fetched());
    assert!(!store.loading());
    assert_eq!(store.error().as_deref(), Some(MUNICIPALITIES_UNAVAILABLE));
    assert!(store.sorted_municipalities().is_empty());

    store.fetch_municipalities().await;
    assert_eq!(api.calls().await, 2);
    assert!(store.has_fetched());
    assert_eq!(store.error(), None);
    assert_eq!(store.sorted_municipalities().len(), 5);
}

#[tokio::test]
async fn empty_result_does_not_suppress_refetch() {
    let api = ScriptedReferenceApi::new(vec![Ok(Vec::new()), Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api.clone());

    store.fetch_municipalities().await;
    assert!(store.has_fetched());
    assert!(store.sorted_municipalities().is_empty());

    store.fetch_municipalities().await;
    assert_eq!(api.calls().await, 2);
    assert_eq!(store.sorted_municipalities().len(), 5);
}

#[tokio::test]
async fn failed_refetch_reports_error_without_clearing_fetched_flag() {
    let api = ScriptedReferenceApi::new(vec![Ok(Vec::new()), Err(unavailable())]);
    let store = MunicipalityStore::new(api.clone());

    store.fetch_municipalities().await;
    store.fetch_municipalities().await;

    assert_eq!(api.calls().await, 2);
    assert!(store.has_fetched());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn subscribers_observe_loaded_collection() {
    let api = ScriptedReferenceApi::new(vec![Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api);
    let mut rx = store.subscribe();

    store.fetch_municipalities().await;

    assert!(rx.has_changed().expect("store alive"));
    let state = rx.borrow_and_update().clone();
    assert!(state.has_fetched);
    assert!(!state.loading);
    assert_eq!(state.municipalities.len(), 5);
}

#[tokio::test]
async fn lookup_by_id() {
    let api = ScriptedReferenceApi::new(vec![Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api);
    store.fetch_municipalities().await;

    let malmo = store
        .municipality_by_id(&MunicipalityId::new("1280"))
        .expect("known municipality");
    assert_eq!(malmo.name, "Malmö");
    assert_eq!(malmo.region.name, "Skåne");
    assert!(store.municipality_by_id(&MunicipalityId::new("9999")).is_none());
}

#[test]
fn sorted_municipalities_use_swedish_order() {
    let region = region("r3", "Örebro län");
    let state = MunicipalityState {
        municipalities: Arc::new(vec![
            municipality("1880", "Örebro", &region),
            municipality("1440", "Ale", &region),
        ]),
        has_fetched: true,
        ..MunicipalityState::default()
    };

    assert_eq!(names(&state.sorted_municipalities()), vec!["Ale", "Örebro"]);
}

#[test]
fn regions_are_deduplicated_by_id_and_sorted() {
    let stockholm = region("r1", "Stockholm");
    let skane = region("r2", "Skåne");
    let state = MunicipalityState {
        municipalities: Arc::new(vec![
            municipality("0180", "Stockholm", &stockholm),
            municipality("0186", "Lidingö", &stockholm),
            municipality("1280", "Malmö", &skane),
        ]),
        ..MunicipalityState::default()
    };

    let regions = state.regions();
    assert_eq!(regions.len(), 2);
    let ids: Vec<&str> = regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r2", "r1"]);
}

#[test]
fn first_occurrence_of_a_region_wins() {
    let first = region("r1", "Stockholms län");
    let renamed = region("r1", "Region Stockholm");
    let state = MunicipalityState {
        municipalities: Arc::new(vec![
            municipality("0180", "Stockholm", &first),
            municipality("0186", "Lidingö", &renamed),
        ]),
        ..MunicipalityState::default()
    };

    let regions = state.regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].name, "Stockholms län");
}

#[tokio::test]
async fn selected_region_filters_municipalities() {
    let api = ScriptedReferenceApi::new(vec![Ok(sample_municipalities())]);
    let store = MunicipalityStore::new(api.clone());
    store.fetch_municipalities().await;

    assert_eq!(
        names(&store.filtered_municipalities()),
        vec!["Landskrona", "Lidingö", "Malmö", "Stockholm", "Örebro"]
    );

    store.set_selected_region(Some(RegionId::new("r1")));
    assert_eq!(
        names(&store.filtered_municipalities()),
        vec!["Lidingö", "Stockholm"]
    );
    assert_eq!(store.sorted_municipalities().len(), 5);

    store.set_selected_region(None);
    assert_eq!(store.filtered_municipalities().len(), 5);
    assert_eq!(api.calls().await, 1);
}

#[test]
fn lookup_by_id_or_code() {
    let mut municipalities = sample_municipalities();
    municipalities[1].id = MunicipalityId::new("3f0c-stockholm");
    let state = MunicipalityState {
        municipalities: Arc::new(municipalities),
        ..MunicipalityState::default()
    };

    let by_code = state
        .municipality_by_id_or_code(" 0180 ")
        .expect("found by code");
    assert_eq!(by_code.id.as_str(), "3f0c-stockholm");
    let by_id = state
        .municipality_by_id_or_code("3f0c-stockholm")
        .expect("found by id");
    assert_eq!(by_id.name, "Stockholm");
    assert!(state.municipality_by_id_or_code("0000").is_none());
}
