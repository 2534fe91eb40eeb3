//! HTTP request handlers for the payroll API.
//!
//! One handler per exposed operation; each request carries its tenant
//! scope explicitly and every response is JSON.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::period::BatchOptions;
use crate::{bulletin, leave, ledger, loans, period};

use super::request::{
    EmployeeYearRequest, GenerateSlipRequest, LeaveActionRequest, LoanActionRequest, LoanRequest,
    PeriodRequest, SlipRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/slips/generate", post(generate_slip_handler))
        .route("/slips/cancel", post(cancel_slip_handler))
        .route("/slips/get", post(get_slip_handler))
        .route("/periods/generate", post(generate_period_handler))
        .route("/periods/validate", post(validate_period_handler))
        .route("/periods/close", post(close_period_handler))
        .route("/leave/entitlement", post(leave_entitlement_handler))
        .route("/leave/approve", post(leave_approve_handler))
        .route("/leave/reject", post(leave_reject_handler))
        .route("/leave/cancel", post(leave_cancel_handler))
        .route("/loans/request", post(loan_request_handler))
        .route("/loans/approve", post(loan_approve_handler))
        .route("/cumulants/get", post(get_cumulant_handler))
        .with_state(state)
}

fn bad_json(rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::new(
            "MISSING_CONTENT_TYPE",
            "Content-Type must be application/json",
        ),
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

type Response = axum::response::Response;

/// Handler for POST /slips/generate.
async fn generate_slip_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateSlipRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        "processing slip generation"
    );

    let result = state.with_constants(|constants| {
        bulletin::generate_slip(
            state.store(),
            constants,
            request.tenant_id,
            request.employee_id,
            request.period_id,
            None,
        )
    });
    match result {
        Ok(slip) => (StatusCode::OK, Json(slip)).into_response(),
        Err(failure) => ApiErrorResponse::from(failure).into_response(),
    }
}

/// Handler for POST /slips/cancel.
async fn cancel_slip_handler(
    State(state): State<AppState>,
    payload: Result<Json<SlipRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match bulletin::cancel_slip(state.store(), request.tenant_id, request.slip_id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "cancelled" }))).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /slips/get.
async fn get_slip_handler(
    State(state): State<AppState>,
    payload: Result<Json<SlipRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match state.store().slip(request.tenant_id, request.slip_id) {
        Ok(slip) => (StatusCode::OK, Json(slip)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /periods/generate.
async fn generate_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        period_id = %request.period_id,
        "processing batch generation"
    );

    let options = BatchOptions {
        cancel: None,
        deadline: request.deadline_secs.map(Duration::from_secs),
    };
    let result = state.with_constants(|constants| {
        period::generate_period(
            state.store(),
            constants,
            request.tenant_id,
            request.period_id,
            options,
        )
    });
    match result {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /periods/validate.
async fn validate_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match period::validate_period(state.store(), request.tenant_id, request.period_id) {
        Ok(state) => (StatusCode::OK, Json(json!({ "state": state }))).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /periods/close.
async fn close_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<PeriodRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match period::close_period(state.store(), request.tenant_id, request.period_id) {
        Ok(state) => (StatusCode::OK, Json(json!({ "state": state }))).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /leave/entitlement.
async fn leave_entitlement_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeYearRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    let result = state.with_constants(|constants| {
        leave::entitlement(
            state.store(),
            constants,
            request.tenant_id,
            request.employee_id,
            request.year,
        )
    });
    match result {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /leave/approve.
async fn leave_approve_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveActionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    let result = state.with_constants(|constants| {
        leave::approve(
            state.store(),
            constants,
            request.tenant_id,
            request.leave_request_id,
        )
    });
    match result {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /leave/reject.
async fn leave_reject_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveActionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match leave::reject(state.store(), request.tenant_id, request.leave_request_id) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /leave/cancel.
async fn leave_cancel_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveActionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match leave::cancel(state.store(), request.tenant_id, request.leave_request_id) {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /loans/request.
async fn loan_request_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoanRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match loans::request_loan(
        state.store(),
        request.tenant_id,
        request.employee_id,
        request.principal,
        request.rate,
        request.term_months,
        request.start_date,
    ) {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /loans/approve.
async fn loan_approve_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoanActionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match loans::approve_loan(state.store(), request.tenant_id, request.loan_id) {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}

/// Handler for POST /cumulants/get.
async fn get_cumulant_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeYearRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };
    match ledger::get_cumulant(
        state.store(),
        request.tenant_id,
        request.employee_id,
        request.year,
    ) {
        Ok(cumulant) => (StatusCode::OK, Json(cumulant)).into_response(),
        Err(error) => ApiErrorResponse::from(error).into_response(),
    }
}
