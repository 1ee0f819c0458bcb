use axum::{extract::State, Extension};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::qr_service::QrTicket;
use crate::services::QrService;
use crate::state::AppState;

/// POST /api/generate-qr - one-time login ticket for a second device
///
/// Returns `{xid, link}`; `link` points at the rendered SVG under
/// `/api/public/qr/`.
pub async fn post(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<QrTicket> {
    let ticket = QrService::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.server.public_base_url.clone(),
        state.config.server.public_dir.clone(),
    )
    .generate(user.user_id)
    .await?;

    Ok(ApiResponse::created(ticket))
}
