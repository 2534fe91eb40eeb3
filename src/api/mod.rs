//! HTTP API for the payroll engine.
//!
//! A thin axum facade over the engine operations; authentication and
//! tenant routing live upstream.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    EmployeeYearRequest, GenerateSlipRequest, LeaveActionRequest, LoanActionRequest, LoanRequest,
    PeriodRequest, SlipRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
