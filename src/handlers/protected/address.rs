use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::address_service::{AddressInput, UserAddressView};
use crate::services::AddressService;
use crate::state::AppState;

/// POST /api/address - register the caller's address (one per account)
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AddressInput>, JsonRejection>,
) -> ApiResult<UserAddressView> {
    let Json(input) = payload?;
    let address = AddressService::new(state.store.clone()).create(user.user_id, input).await?;
    Ok(ApiResponse::created(address))
}

/// PUT /api/address
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AddressInput>, JsonRejection>,
) -> ApiResult<UserAddressView> {
    let Json(input) = payload?;
    let address = AddressService::new(state.store.clone()).update(user.user_id, input).await?;
    Ok(ApiResponse::success(address))
}

/// GET /api/address
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserAddressView> {
    let address = AddressService::new(state.store.clone()).get(user.user_id).await?;
    Ok(ApiResponse::success(address))
}

/// DELETE /api/address
pub async fn delete(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<()> {
    AddressService::new(state.store.clone()).remove(user.user_id).await?;
    Ok(ApiResponse::no_content())
}
