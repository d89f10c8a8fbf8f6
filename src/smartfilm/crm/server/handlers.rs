use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::smartfilm::crm::error::{CrmError, Result};
use crate::smartfilm::crm::import::import_csv;
use crate::smartfilm::crm::io::LeadStore;
use crate::smartfilm::crm::model::{LeadId, NewLead, QuoteRequest};
use crate::smartfilm::crm::reconcile::{Direction, SyncReport, reconcile};
use crate::smartfilm::crm::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    pub direction: Option<String>,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    ok: bool,
    #[serde(flatten)]
    report: SyncReport,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    ok: bool,
    imported: usize,
}

#[derive(Debug, Serialize)]
struct QuoteResponse {
    ok: bool,
    id: LeadId,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "smartfilm-crm",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Runs one reconciliation pass in the requested direction.
#[instrument(level = "info", skip_all)]
pub async fn sync_sheets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SyncParams>,
) -> Response {
    if !is_authorized(&state, &headers) {
        return unauthorized();
    }

    let direction = match params.direction.as_deref() {
        None => Direction::default(),
        Some(text) => match text.parse::<Direction>() {
            Ok(direction) => direction,
            Err(error) => return error_response(StatusCode::BAD_REQUEST, &error),
        },
    };

    info!(%direction, "sync requested");
    let paths = state.config.paths.clone();
    let outcome = run_exclusive(&state, move || {
        let mut store = paths.lead_store();
        let mut sheet = paths.lead_sheet();
        reconcile(&mut store, &mut sheet, direction)
    })
    .await;

    match outcome {
        Ok(report) => Json(SyncResponse { ok: true, report }).into_response(),
        Err(error) => {
            error!(%error, "sync failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error)
        }
    }
}

/// Imports the CSV document sent as the request body.
#[instrument(level = "info", skip_all, fields(bytes = body.len()))]
pub async fn import_leads(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !is_authorized(&state, &headers) {
        return unauthorized();
    }

    let paths = state.config.paths.clone();
    let outcome = run_exclusive(&state, move || {
        let mut store = paths.lead_store();
        import_csv(&mut store, &body)
    })
    .await;

    match outcome {
        Ok(imported) => Json(ImportResponse { ok: true, imported }).into_response(),
        Err(error @ (CrmError::EmptyImport | CrmError::NoValidLeads | CrmError::Csv(_))) => {
            warn!(%error, "CSV rejected");
            error_response(StatusCode::BAD_REQUEST, &error)
        }
        Err(error) => {
            error!(%error, "CSV import failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error)
        }
    }
}

/// Stores a submission of the public quote form. Needs no bearer token.
#[instrument(level = "info", skip_all)]
pub async fn submit_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Response {
    if let Err(error) = request.validate() {
        warn!(%error, "quote request rejected");
        return error_response(StatusCode::BAD_REQUEST, &error);
    }

    let paths = state.config.paths.clone();
    let outcome = run_exclusive(&state, move || {
        let mut store = paths.lead_store();
        store.insert_lead(NewLead::quote_form(request))
    })
    .await;

    match outcome {
        Ok(lead) => {
            info!(lead_id = %lead.id, "quote request stored");
            (
                StatusCode::CREATED,
                Json(QuoteResponse {
                    ok: true,
                    id: lead.id,
                }),
            )
                .into_response()
        }
        Err(error) => {
            error!(%error, "quote request not stored");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error)
        }
    }
}

fn is_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.config.secret.authorizes(header)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, error: &CrmError) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Runs store work on the blocking pool while holding the store lock.
async fn run_exclusive<T, F>(state: &AppState, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let guard = Arc::clone(&state.store_lock).lock_owned().await;
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        work()
    })
    .await
    .map_err(|join_error| CrmError::Server(join_error.to_string()))?
}
