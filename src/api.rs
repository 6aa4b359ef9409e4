use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SharedBridge, SharedCatalog, SharedCompanies, SharedReader};
use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use stockpredict::{
    error::StockError,
    models::{
        CompaniesResponse, HistoryResponse, PredictRequestBody, PredictionRequest,
        PredictionResult, StocksResponse, Symbol,
    },
    utils::Timer,
};
use tracing::{debug, info, instrument};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/stocks", get(list_stocks_handler))
        .route("/companies", get(companies_handler))
        .route("/api/stock-history/{symbol}", get(stock_history_handler))
        .route("/api/predict", post(predict_handler))
        .with_state(state)
}

pub async fn root_handler() -> &'static str {
    "Hello, World!"
}

#[instrument(skip(catalog))]
pub async fn list_stocks_handler(State(catalog): State<SharedCatalog>) -> ApiResult<Json<StocksResponse>> {
    let stocks: Vec<String> = catalog
        .list_symbols()
        .map_err(|e| ApiError::listing(e, "Failed to list stocks"))?
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    info!(symbol_count = stocks.len(), "Returning stock list");
    Ok(Json(StocksResponse { stocks }))
}

#[instrument(skip(companies))]
pub async fn companies_handler(State(companies): State<SharedCompanies>) -> ApiResult<Json<CompaniesResponse>> {
    let companies = tokio::task::spawn_blocking(move || companies.load())
        .await
        .map_err(|e| ApiError::listing(StockError::Bridge(e.to_string()), "Failed to load company names"))?
        .map_err(|e| ApiError::listing(e, "Failed to load company names"))?;

    debug!(company_count = companies.len(), "Returning company names");
    Ok(Json(CompaniesResponse { companies }))
}

#[instrument(skip(reader))]
pub async fn stock_history_handler(
    State(reader): State<SharedReader>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let symbol = Symbol::parse(&symbol).map_err(ApiError::history)?;
    let timer = Timer::start("history");

    let window = reader.default_window();
    let read_symbol = symbol.clone();
    let history = tokio::task::spawn_blocking(move || reader.load_recent_history(&read_symbol, window))
        .await
        .map_err(|e| ApiError::history(StockError::Bridge(e.to_string())))?
        .map_err(ApiError::history)?;

    info!(
        %symbol,
        points = history.points.len(),
        day_change_percent = history.summary.day_change_percent,
        elapsed_ms = timer.elapsed_ms(),
        "Returning stock history"
    );
    Ok(Json(HistoryResponse {
        data: history.points,
        info: history.summary,
    }))
}

#[instrument(skip(bridge, body))]
pub async fn predict_handler(State(bridge): State<SharedBridge>, body: Bytes) -> ApiResult<Json<PredictionResult>> {
    // An empty or non-JSON body is treated like a body without a symbol
    let request: PredictRequestBody = serde_json::from_slice(&body).unwrap_or_default();

    let PredictionRequest { symbol, algorithm } =
        request.into_request().map_err(ApiError::prediction)?;

    debug!(%symbol, %algorithm, "Running prediction");
    let timer = Timer::start("predict");
    let result = bridge.predict(&symbol, &algorithm).await.map_err(ApiError::prediction)?;

    info!(
        %symbol,
        %algorithm,
        trend = %result.trend,
        elapsed_ms = timer.elapsed_ms(),
        "Prediction complete"
    );
    Ok(Json(result))
}
