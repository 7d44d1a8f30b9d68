// Integration tests for FairRent
use actix_web::{test, web, App};
use fairrent_api::{AppState, RestApi};
use fairrent_core::{
    CategoryEncoder, Encoders, Estimator, EstimatorKind, Fairness, InferenceService, Listing,
    MeanBaseline, ModelBundle, TrainingConfig, TrainingPipeline,
};
use fairrent_storage::{read_records, ModelStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn constant_bundle(value: f64) -> ModelBundle {
    ModelBundle::full(
        Estimator::Mean(MeanBaseline::new(value)),
        Encoders {
            location: CategoryEncoder::fit(["Pune", "Mumbai"]),
            connectivity: CategoryEncoder::fit(["low", "medium", "high"]),
            utility: CategoryEncoder::fit(["average", "good"]),
            lifestyle: CategoryEncoder::fit(["standard", "premium"]),
        },
    )
}

/// Store with a saved artifact and a service loaded from it.
fn loaded_state(dir: &TempDir, value: f64) -> AppState {
    let store = Arc::new(ModelStore::new(dir.path().join("rent_model.bundle")));
    store.save(&constant_bundle(value)).unwrap();
    let service = Arc::new(InferenceService::new(store.load_or_degrade()));
    AppState::new(service, store)
}

fn unloaded_state(dir: &TempDir) -> AppState {
    let store = Arc::new(ModelStore::new(dir.path().join("rent_model.bundle")));
    let service = Arc::new(InferenceService::new(store.load_or_degrade()));
    AppState::new(service, store)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(RestApi::configure),
        )
        .await
    };
}

const FLATS_CSV: &str = "\
location,price,size,area,rooms,number_of_bhk,amenities,connectivity,utility,lifestyle
Pune,14000,800,800,2,2,wifi|parking,medium,average,standard
Pune,15500,900,900,2,2,wifi|parking|lift,high,good,standard
Pune,12000,650,650,1,1,wifi,medium,average,standard
Pune,18000,1100,1100,3,3,wifi|parking|lift|gym,high,good,premium
Mumbai,32000,800,800,2,2,wifi|parking,high,good,premium
Mumbai,35000,900,900,2,2,wifi|parking|lift,high,good,premium
Mumbai,27000,650,650,1,1,wifi,medium,average,standard
Mumbai,42000,1100,1100,3,3,wifi|parking|lift|gym,high,good,premium
Pune,13000,700,700,1,1,parking,low,average,standard
Mumbai,30000,700,700,1,1,parking,medium,average,standard
";

#[actix_web::test]
async fn test_health_reports_loaded_model() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(loaded_state(&dir, 10_000.0));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "ok", "model_loaded": true}));
}

#[actix_web::test]
async fn test_health_without_model() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(unloaded_state(&dir));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_loaded"], false);
}

#[actix_web::test]
async fn test_predict_overpriced_listing() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(loaded_state(&dir, 10_000.0));

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "location": "Pune",
            "size_sqft": 850,
            "bhk": 2,
            "asking_rent": 12000,
            "amenities": {"wifi": 1, "parking": 1, "lift": 0, "ac": 1}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["predicted_rent"], 10_000.0);
    assert_eq!(body["fairness"], "Overpriced");
    assert_eq!(body["metrics_source"], "heuristic");
    assert_eq!(body["recommended_flats"].as_array().unwrap().len(), 4);
    assert_eq!(body["recommended_flats"][0]["name"], "Skyline Residency");
    assert_eq!(body["recommended_flats"][0]["rent"], 9_000.0);

    let livability = body["livability_score"].as_f64().unwrap();
    assert!((7.0..=9.5).contains(&livability));
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((85.0..=99.0).contains(&confidence));
}

#[actix_web::test]
async fn test_predict_without_asking_rent_is_not_applicable() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(loaded_state(&dir, 10_000.0));

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"location": "Pune", "size_sqft": 850, "bhk": 2}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["fairness"], "N/A");
}

#[actix_web::test]
async fn test_predict_rejects_invalid_field() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(loaded_state(&dir, 10_000.0));

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"location": "Pune", "size_sqft": "huge", "bhk": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "fail");
    assert!(body["error"].as_str().unwrap().contains("size_sqft"));
}

#[actix_web::test]
async fn test_predict_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(loaded_state(&dir, 10_000.0));

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"location\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "fail");
}

#[actix_web::test]
async fn test_predict_without_model_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let app = init_app!(unloaded_state(&dir));

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"location": "Pune", "size_sqft": 850, "bhk": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "Model not loaded", "status": "fail"}));
}

#[actix_web::test]
async fn test_reload_picks_up_new_artifact() {
    let dir = TempDir::new().unwrap();
    let state = unloaded_state(&dir);
    let store = state.store.clone();
    let app = init_app!(state);

    let req = test::TestRequest::post().uri("/reload").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    store.save(&constant_bundle(7_500.0)).unwrap();

    let req = test::TestRequest::post().uri("/reload").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"status": "ok", "model_loaded": true}));

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"location": "Pune", "size_sqft": 600, "bhk": 1, "asking_rent": 7500}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["predicted_rent"], 7_500.0);
    assert_eq!(body["fairness"], "Fair");
}

#[actix_web::test]
async fn test_failed_reload_keeps_serving() {
    let dir = TempDir::new().unwrap();
    let state = loaded_state(&dir, 10_000.0);
    let store = state.store.clone();
    let app = init_app!(state);

    std::fs::write(store.path(), b"not an artifact").unwrap();

    let req = test::TestRequest::post().uri("/reload").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["model_loaded"], true);
}

#[::core::prelude::v1::test]
fn test_corrupt_artifact_starts_degraded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rent_model.bundle");
    std::fs::write(&path, b"\x1f\x8b garbage").unwrap();

    let service = InferenceService::new(ModelStore::new(&path).load_or_degrade());
    assert!(!service.is_loaded());
}

#[::core::prelude::v1::test]
fn test_train_save_load_predict() {
    let records = read_records(FLATS_CSV.as_bytes()).unwrap();
    assert_eq!(records.len(), 10);

    let config = TrainingConfig {
        n_estimators: 25,
        test_fraction: 0.0,
        ..TrainingConfig::default()
    };
    let bundle = TrainingPipeline::new(config).unwrap().fit(&records).unwrap();
    assert_eq!(bundle.estimator().kind(), EstimatorKind::RandomForest);

    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path().join("models").join("rent_model.bundle"));
    store.save(&bundle).unwrap();

    let service = InferenceService::new(Some(store.load().unwrap()));
    let pune = service
        .predict(&Listing::new("Pune", 850.0, 2).with_asking_rent(14_500.0))
        .unwrap();
    let mumbai = service
        .predict(&Listing::new("Mumbai", 850.0, 2).with_asking_rent(14_500.0))
        .unwrap();

    assert!(pune.predicted_rent > 10_000.0 && pune.predicted_rent < 20_000.0);
    assert!(mumbai.predicted_rent > pune.predicted_rent);
    assert_eq!(mumbai.fairness, Fairness::Underpriced);
    assert!(pune.confidence > 85.0);
}

#[::core::prelude::v1::test]
fn test_reloaded_artifact_predicts_identically() {
    let records = read_records(FLATS_CSV.as_bytes()).unwrap();
    let config = TrainingConfig {
        estimator: EstimatorKind::Linear,
        ..TrainingConfig::default()
    };
    let outcome = TrainingPipeline::new(config)
        .unwrap()
        .fit_and_evaluate(&records)
        .unwrap();
    let evaluation = outcome.evaluation.unwrap();
    assert_eq!(evaluation.n_train + evaluation.n_test, 10);

    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path().join("rent_model.bundle"));
    store.save(&outcome.bundle).unwrap();

    let listing = Listing::new("Pune", 900.0, 2).with_connectivity("high");
    let before = InferenceService::new(Some(outcome.bundle)).predict(&listing).unwrap();
    let after = InferenceService::new(Some(store.load().unwrap())).predict(&listing).unwrap();
    assert_eq!(before.predicted_rent, after.predicted_rent);
}

#[::core::prelude::v1::test]
fn test_reloaded_forest_predicts_identically() {
    let records = read_records(FLATS_CSV.as_bytes()).unwrap();
    let config = TrainingConfig {
        n_estimators: 25,
        ..TrainingConfig::default()
    };
    let outcome = TrainingPipeline::new(config)
        .unwrap()
        .fit_and_evaluate(&records)
        .unwrap();
    assert_eq!(outcome.bundle.estimator().kind(), EstimatorKind::RandomForest);

    let dir = TempDir::new().unwrap();
    let store = ModelStore::new(dir.path().join("rent_model.bundle"));
    store.save(&outcome.bundle).unwrap();

    let before = InferenceService::new(Some(outcome.bundle));
    let after = InferenceService::new(Some(store.load().unwrap()));
    for listing in [
        Listing::new("Pune", 900.0, 2).with_connectivity("high"),
        Listing::new("Mumbai", 650.0, 1).with_asking_rent(27_000.0),
        Listing::new("Nagpur", 1200.0, 3).with_lifestyle("premium"),
    ] {
        let a = before.predict(&listing).unwrap();
        let b = after.predict(&listing).unwrap();
        assert_eq!(a.predicted_rent, b.predicted_rent);
        assert_eq!(a.fairness, b.fairness);
    }
}
