// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use sitecost_domain::{AggregateLevel, AggregateRef, Granularity};
use sitecost_engine::{Db, EngineError, ReportService, ReportStatus, WorkerConfig, workers};
use sitecost_persistence::Persistence;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// SiteCost Server - HTTP server for the SiteCost aggregation engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between day-level rebuild queue polls
    #[arg(long, default_value_t = 2)]
    day_poll_secs: u64,

    /// Seconds between month-level rebuild queue polls
    #[arg(long, default_value_t = 5)]
    month_poll_secs: u64,

    /// Seconds between year-level rebuild queue polls
    #[arg(long, default_value_t = 15)]
    year_poll_secs: u64,

    /// Seconds between master-level rebuild queue polls
    #[arg(long, default_value_t = 60)]
    master_poll_secs: u64,

    /// How many aggregates one poll claims and rebuilds
    #[arg(long, default_value_t = 16)]
    claim_batch: i64,

    /// Seconds after which a pending rebuild claim counts as stalled
    #[arg(long, default_value_t = 300)]
    stall_timeout_secs: i64,

    /// Seconds between stall reclaimer runs
    #[arg(long, default_value_t = 60)]
    reclaim_interval_secs: u64,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// Shared persistence handle, also held by the worker loops.
    db: Db,
    /// Read/notify facade over the report store.
    service: ReportService,
}

impl AppState {
    fn new(db: Db) -> Self {
        let service: ReportService = ReportService::new(db.clone());
        Self { db, service }
    }
}

/// One raw-record change coordinate.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RawChangeItem {
    /// The jobsite the record belongs to.
    jobsite_id: i64,
    /// The record's UTC timestamp (old or new value, one item each).
    occurred_at: DateTime<Utc>,
}

/// API request for raw-record change notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RawChangeApiRequest {
    /// The changed coordinates. A moved record sends both days.
    changes: Vec<RawChangeItem>,
}

/// One invoice change coordinate.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct InvoiceChangeItem {
    /// The jobsite the invoice belongs to.
    jobsite_id: i64,
    /// The invoice date (old or new value, one item each).
    invoice_date: NaiveDate,
}

/// API request for invoice change notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct InvoiceChangeApiRequest {
    /// The changed coordinates. A re-dated invoice sends both dates.
    changes: Vec<InvoiceChangeItem>,
}

/// API request for an explicit rebuild of one aggregate.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RebuildApiRequest {
    /// The aggregate level: Day, Month, Year, or Master.
    level: String,
    /// The jobsite (required for Day, Month, and Year).
    #[serde(skip_serializing_if = "Option::is_none")]
    jobsite_id: Option<i64>,
    /// Any date inside the period (required for Day, Month, and Year).
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    /// The fiscal year (required for Master).
    #[serde(skip_serializing_if = "Option::is_none")]
    fiscal_year: Option<i32>,
}

/// Query parameters for the day report endpoint.
#[derive(Debug, Deserialize)]
struct DayReportQuery {
    /// The jobsite.
    jobsite_id: i64,
    /// The calendar day.
    day: NaiveDate,
}

/// Query parameters for the period report endpoint.
#[derive(Debug, Deserialize)]
struct PeriodReportQuery {
    /// The jobsite.
    jobsite_id: i64,
    /// The period granularity: Month or Year.
    granularity: String,
    /// Any date inside the period.
    date: NaiveDate,
}

/// Query parameters for the master report endpoint.
#[derive(Debug, Deserialize)]
struct MasterReportQuery {
    /// The fiscal year.
    fiscal_year: i32,
}

/// API response for write operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WriteResponse {
    /// Success indicator.
    success: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl HttpError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<EngineError> for HttpError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Build(_) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: err.to_string(),
            },
            EngineError::DomainViolation(_) => Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            },
            EngineError::Persistence(_) | EngineError::Serialization(_) => {
                error!(error = %err, "Engine error");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Resolves a rebuild request into the aggregate it names.
fn resolve_aggregate(req: &RebuildApiRequest) -> Result<AggregateRef, HttpError> {
    let level: AggregateLevel = AggregateLevel::from_str(&req.level)
        .map_err(|err| HttpError::bad_request(err.to_string()))?;
    match level {
        AggregateLevel::Master => {
            let fiscal_year: i32 = req.fiscal_year.ok_or_else(|| {
                HttpError::bad_request("fiscal_year is required for Master rebuilds")
            })?;
            Ok(AggregateRef::master(fiscal_year))
        }
        AggregateLevel::Day | AggregateLevel::Month | AggregateLevel::Year => {
            let jobsite_id: i64 = req.jobsite_id.ok_or_else(|| {
                HttpError::bad_request("jobsite_id is required for jobsite-level rebuilds")
            })?;
            let date: NaiveDate = req.date.ok_or_else(|| {
                HttpError::bad_request("date is required for jobsite-level rebuilds")
            })?;
            Ok(match level {
                AggregateLevel::Day => AggregateRef::day(jobsite_id, date),
                AggregateLevel::Month => AggregateRef::month(jobsite_id, date),
                _ => AggregateRef::year(jobsite_id, date),
            })
        }
    }
}

/// Handler for POST `/notify/raw-change` endpoint.
///
/// Marks the day reports owning the given record timestamps stale.
async fn handle_notify_raw_change(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RawChangeApiRequest>,
) -> Result<Json<WriteResponse>, HttpError> {
    info!(count = req.changes.len(), "Handling raw change notification");

    let changes: Vec<(i64, DateTime<Utc>)> = req
        .changes
        .iter()
        .map(|item| (item.jobsite_id, item.occurred_at))
        .collect();
    app_state.service.notify_raw_change(&changes, Utc::now())?;

    Ok(Json(WriteResponse {
        success: true,
        message: Some(format!("Marked {} change(s)", req.changes.len())),
    }))
}

/// Handler for POST `/notify/invoice-change` endpoint.
///
/// Marks the month and year reports owning the given invoice dates stale.
async fn handle_notify_invoice_change(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<InvoiceChangeApiRequest>,
) -> Result<Json<WriteResponse>, HttpError> {
    info!(count = req.changes.len(), "Handling invoice change notification");

    let changes: Vec<(i64, NaiveDate)> = req
        .changes
        .iter()
        .map(|item| (item.jobsite_id, item.invoice_date))
        .collect();
    app_state
        .service
        .notify_invoice_change(&changes, Utc::now())?;

    Ok(Json(WriteResponse {
        success: true,
        message: Some(format!("Marked {} change(s)", req.changes.len())),
    }))
}

/// Handler for POST /rebuild endpoint.
///
/// Queues an explicit rebuild of one aggregate.
async fn handle_rebuild(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RebuildApiRequest>,
) -> Result<Json<WriteResponse>, HttpError> {
    let aggregate: AggregateRef = resolve_aggregate(&req)?;
    info!(level = %aggregate.level, jobsite_id = aggregate.jobsite_id,
        period_start = %aggregate.period_start, "Handling rebuild request");

    app_state.service.request_rebuild(&aggregate, Utc::now())?;

    Ok(Json(WriteResponse {
        success: true,
        message: Some(format!(
            "Queued {} rebuild for {}",
            aggregate.level, aggregate.period_start
        )),
    }))
}

/// Handler for GET `/reports/day` endpoint.
async fn handle_get_day_report(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<DayReportQuery>,
) -> Result<Response, HttpError> {
    info!(jobsite_id = params.jobsite_id, day = %params.day, "Handling day report request");

    let status: Option<ReportStatus<sitecost_domain::DayReport>> = app_state
        .service
        .get_day_report(params.jobsite_id, params.day)?;
    status.map_or_else(
        || {
            Err(HttpError::not_found(format!(
                "No day report for jobsite {} on {}",
                params.jobsite_id, params.day
            )))
        },
        |status| Ok(Json(status).into_response()),
    )
}

/// Handler for GET `/reports/period` endpoint.
async fn handle_get_period_report(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<PeriodReportQuery>,
) -> Result<Response, HttpError> {
    info!(
        jobsite_id = params.jobsite_id,
        granularity = %params.granularity,
        date = %params.date,
        "Handling period report request"
    );

    let granularity: Granularity = Granularity::from_str(&params.granularity)
        .map_err(|err| HttpError::bad_request(err.to_string()))?;
    let status: Option<ReportStatus<sitecost_domain::PeriodReport>> = app_state
        .service
        .get_period_report(params.jobsite_id, granularity, params.date)?;
    status.map_or_else(
        || {
            Err(HttpError::not_found(format!(
                "No {} report for jobsite {} containing {}",
                granularity, params.jobsite_id, params.date
            )))
        },
        |status| Ok(Json(status).into_response()),
    )
}

/// Handler for GET `/reports/master` endpoint.
async fn handle_get_master_report(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<MasterReportQuery>,
) -> Result<Response, HttpError> {
    info!(fiscal_year = params.fiscal_year, "Handling master report request");

    let status: Option<ReportStatus<sitecost_domain::MasterReport>> =
        app_state.service.get_master_report(params.fiscal_year)?;
    status.map_or_else(
        || {
            Err(HttpError::not_found(format!(
                "No master report for fiscal year {}",
                params.fiscal_year
            )))
        },
        |status| Ok(Json(status).into_response()),
    )
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/notify/raw-change", post(handle_notify_raw_change))
        .route("/notify/invoice-change", post(handle_notify_invoice_change))
        .route("/rebuild", post(handle_rebuild))
        .route("/reports/day", get(handle_get_day_report))
        .route("/reports/period", get(handle_get_period_report))
        .route("/reports/master", get(handle_get_master_report))
        .with_state(app_state)
}

fn worker_config(args: &Args) -> WorkerConfig {
    WorkerConfig {
        day_poll_interval: std::time::Duration::from_secs(args.day_poll_secs),
        month_poll_interval: std::time::Duration::from_secs(args.month_poll_secs),
        year_poll_interval: std::time::Duration::from_secs(args.year_poll_secs),
        master_poll_interval: std::time::Duration::from_secs(args.master_poll_secs),
        claim_batch: args.claim_batch,
        stall_timeout: chrono::Duration::seconds(args.stall_timeout_secs),
        reclaim_interval: std::time::Duration::from_secs(args.reclaim_interval_secs),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing SiteCost Server");

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let db: Db = Arc::new(Mutex::new(persistence));
    let app_state: AppState = AppState::new(db);

    // Spawn the rebuild workers and the stall reclaimer
    let handles = workers::spawn(&app_state.db, worker_config(&args));
    info!(workers = handles.len(), "Rebuild workers running");

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
