use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::application::AppError;
use crate::domain::{
    Appointment, Doctor, DoctorId, FinancialReport, FormattedReport, Summary, is_valid_amount,
};

use super::{AppState, IdPath, JsonBody};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::DoctorNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::InvalidNumber(_) => StatusCode::BAD_REQUEST,
            AppError::Database(err) => {
                error!(error = %err, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub percentage: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorChanges {
    pub name: Option<String>,
    pub percentage: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NewAppointment {
    pub doctor_id: DoctorId,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: FinancialReport,
    pub formatted: FormattedReport,
}

pub async fn index(State(state): State<AppState>) -> Json<Summary> {
    Json(state.store.summary().await)
}

pub async fn list_doctors(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Doctor>> {
    let doctors = match params.search.as_deref() {
        Some(query) => state.store.search_doctors(query).await,
        None => state.store.list_doctors().await,
    };
    Json(doctors)
}

pub async fn create_doctor(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewDoctor>,
) -> Result<(StatusCode, Json<Doctor>), AppError> {
    match state
        .store
        .register_doctor(&body.name, body.percentage)
        .await?
    {
        Some(doctor) => Ok((StatusCode::CREATED, Json(doctor))),
        None => Err(AppError::InvalidInput(
            "name is required and percentage must be >= 0".to_string(),
        )),
    }
}

pub async fn get_doctor(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Doctor>, AppError> {
    state
        .store
        .get_doctor(id)
        .await
        .map(Json)
        .ok_or(AppError::DoctorNotFound(id))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(body): JsonBody<DoctorChanges>,
) -> Result<Json<Doctor>, AppError> {
    if !state
        .store
        .update_doctor(id, body.name.as_deref(), body.percentage)
        .await?
    {
        // Unknown and invalid look the same from the store; tell them apart here.
        return Err(match state.store.get_doctor(id).await {
            None => AppError::DoctorNotFound(id),
            Some(_) => AppError::InvalidInput(
                "name must not be blank and percentage must be >= 0".to_string(),
            ),
        });
    }
    get_doctor(State(state), IdPath(id)).await
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<StatusCode, AppError> {
    if state.store.remove_doctor(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::DoctorNotFound(id))
    }
}

pub async fn list_appointments(State(state): State<AppState>) -> Json<Vec<Appointment>> {
    Json(state.store.list_appointments().await)
}

pub async fn create_appointment(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    if !is_valid_amount(body.amount) {
        return Err(AppError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    match state
        .store
        .register_appointment(body.doctor_id, body.amount)
        .await?
    {
        Some(appointment) => Ok((StatusCode::CREATED, Json(appointment))),
        None => Err(AppError::DoctorNotFound(body.doctor_id)),
    }
}

pub async fn report(State(state): State<AppState>) -> Json<ReportResponse> {
    let report = state.store.financial_report().await;
    let formatted = report.formatted();
    Json(ReportResponse { report, formatted })
}
