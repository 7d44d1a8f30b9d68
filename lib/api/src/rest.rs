use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse, HttpResponseBuilder, HttpServer, Result as ActixResult};
use fairrent_core::{Error, InferenceService, PredictionResult};
use fairrent_storage::ModelStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// Shared state of the HTTP workers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
    pub store: Arc<ModelStore>,
}

impl AppState {
    pub fn new(service: Arc<InferenceService>, store: Arc<ModelStore>) -> Self {
        Self { service, store }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

#[derive(Serialize)]
struct PredictResponse<'a> {
    #[serde(flatten)]
    result: &'a PredictionResult,
    status: &'static str,
}

fn failure(mut builder: HttpResponseBuilder, message: impl Into<String>) -> HttpResponse {
    builder.json(serde_json::json!({
        "error": message.into(),
        "status": "fail"
    }))
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, host: String, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::configure)
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }

    /// Register routes. Malformed JSON bodies get the same failure shape as
    /// every other error.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let message = err.to_string();
            InternalError::from_response(err, failure(HttpResponse::BadRequest(), message)).into()
        });

        cfg.app_data(json_config)
            .route("/health", web::get().to(health))
            .route("/predict", web::post().to(predict))
            .route("/reload", web::post().to(reload));
    }
}

async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        model_loaded: state.service.is_loaded(),
    }))
}

async fn predict(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let _guard = span.enter();

    match state.service.predict_payload(&body) {
        Ok(result) => Ok(HttpResponse::Ok().json(PredictResponse {
            result: &result,
            status: "ok",
        })),
        Err(e @ Error::InvalidInput { .. }) => {
            warn!(error = %e, "Rejected prediction request");
            Ok(failure(HttpResponse::BadRequest(), e.to_string()))
        }
        Err(Error::ServiceUnavailable) => {
            warn!("Prediction requested without a loaded model");
            Ok(failure(HttpResponse::ServiceUnavailable(), "Model not loaded"))
        }
        Err(e) => {
            error!(error = %e, payload = %body.0, "Prediction failed");
            Ok(failure(HttpResponse::InternalServerError(), "Prediction failed"))
        }
    }
}

async fn reload(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.store.reload_into(&state.service) {
        Ok(()) => {
            info!(path = ?state.store.path(), "Model reloaded");
            Ok(HttpResponse::Ok().json(HealthResponse {
                status: "ok",
                model_loaded: true,
            }))
        }
        Err(e) => {
            error!(error = %e, "Model reload failed");
            Ok(failure(HttpResponse::InternalServerError(), e.to_string()))
        }
    }
}
