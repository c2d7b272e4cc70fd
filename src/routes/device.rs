use crate::common::ApiResult;
use crate::extractors::{Identity, IdentityError};
use crate::models::dtos::device::{RegisterDeviceBodyDto, UpdateDeviceBodyDto};
use crate::models::dtos::response::ResponseDto;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Register a device under the caller's account
pub async fn register(
    State(state): State<AppState>,
    caller: Result<Identity, IdentityError>,
    body: Result<Json<RegisterDeviceBodyDto>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let device = state.device_service.register(caller, body).await?;
    Ok(Json(ResponseDto::message(format!(
        "Successfully registered device {}",
        device.mac
    ))))
}

/// Rename a device and/or change its status
pub async fn update(
    State(state): State<AppState>,
    caller: Result<Identity, IdentityError>,
    body: Result<Json<UpdateDeviceBodyDto>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    state.device_service.update(caller, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
