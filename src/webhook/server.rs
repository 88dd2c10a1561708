// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::net::SocketAddr;
use std::path::Path;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use http::{header, StatusCode};
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use tracing::{error, info};

use crate::error::{KabError, Result};
use crate::events::EventSender;
use crate::metrics::BackupMetrics;

pub fn webhook_router(events: EventSender) -> Router {
    Router::new()
        .route("/mutate", post(mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(events)
}

pub fn metrics_router(metrics: BackupMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(metrics)
}

/// Serve the admission webhook over TLS until the server fails
pub async fn serve_webhook(
    addr: SocketAddr,
    cert_file: &Path,
    key_file: &Path,
    events: EventSender,
) -> Result<()> {
    let tls_config = RustlsConfig::from_pem_file(cert_file, key_file)
        .await
        .map_err(|e| KabError::Server(format!("TLS config error: {}", e)))?;

    info!(addr = %addr, "Starting admission webhook server");

    axum_server::bind_rustls(addr, tls_config)
        .serve(webhook_router(events).into_make_service())
        .await
        .map_err(|e| KabError::Server(format!("Webhook server error: {}", e)))
}

/// Serve `/metrics` over plain HTTP
pub async fn serve_metrics(addr: SocketAddr, metrics: BackupMetrics) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KabError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    info!(addr = %addr, "Starting metrics server");

    axum::serve(listener, metrics_router(metrics))
        .await
        .map_err(|e| KabError::Server(format!("Metrics server error: {}", e)))
}

async fn mutate_handler(
    State(events): State<EventSender>,
    Json(body): Json<AdmissionReview<Pod>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<Pod> = match body.try_into() {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let fallback = AdmissionResponse::from(&request);
    let response = match events.submit_admission(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Admission request was not answered");
            fallback.deny(e.to_string())
        }
    };

    Json(response.into_review())
}

async fn metrics_handler(State(metrics): State<BackupMetrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
