use axum::extract::{rejection::PathRejection, Path, State};

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{QrService, Session};
use crate::state::AppState;

/// PUT /api/login/with-qr/:xid - redeem a one-time QR ticket
///
/// 404 for an unknown ticket, 409 once it has been used.
pub async fn put(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Session> {
    let Path(xid) = path?;

    let session = QrService::new(
        state.store.clone(),
        state.tokens.clone(),
        state.config.server.public_base_url.clone(),
        state.config.server.public_dir.clone(),
    )
    .redeem(&xid)
    .await?;

    Ok(ApiResponse::success(session))
}
