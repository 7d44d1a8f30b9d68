//! HTTP surface of FairRent.
//!
//! `GET /health`, `POST /predict` and `POST /reload`, served by actix-web
//! over a shared [`fairrent_core::InferenceService`].

pub mod rest;

pub use rest::{AppState, RestApi};
