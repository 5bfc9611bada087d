use crate::{
    api::{error::ApiError, response::ApiResponse},
    models::{AddressValidation, WalletSnapshot},
    state::AppState,
    validation::validate_address,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wallet/{address}", get(get_wallet))
        .route("/validate/{address}", get(validate))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// GET /wallet/{address} handler
async fn get_wallet(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<WalletSnapshot>, ApiError> {
    info!("Processing wallet request for address: {}", address);

    let snapshot = state.wallets.get_wallet_data(&address).await?;
    Ok(ApiResponse { data: snapshot })
}

// GET /validate/{address} handler, format check only
async fn validate(Path(address): Path<String>) -> ApiResponse<AddressValidation> {
    ApiResponse {
        data: validate_address(&address),
    }
}
