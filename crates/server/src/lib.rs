use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use ledger::LedgerError;

pub use server::{run, run_with_listener, spawn_with_listener};

mod overview;
mod server;
mod transactions;
mod user;
mod wallets;

pub enum ServerError {
    Ledger(LedgerError),
    Generic(String),
}

fn status_for_ledger_error(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::ExistingName(_) => StatusCode::CONFLICT,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        LedgerError::InvalidCursor(_) | LedgerError::InvalidId(_) => StatusCode::BAD_REQUEST,
        LedgerError::InvalidAmount(_)
        | LedgerError::InvalidTransaction(_)
        | LedgerError::InvalidTransfer(_)
        | LedgerError::InvalidWallet(_)
        | LedgerError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_ledger_error(err: LedgerError) -> String {
    match err {
        LedgerError::Storage(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, retryable, error) = match self {
            ServerError::Ledger(err) => (
                status_for_ledger_error(&err),
                err.is_retryable(),
                message_for_ledger_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, false, err),
        };

        (status, Json(ErrorBody { error, retryable })).into_response()
    }
}

impl From<LedgerError> for ServerError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_not_found_maps_to_404() {
        let res = ServerError::from(LedgerError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn ledger_existing_name_maps_to_409() {
        let res = ServerError::from(LedgerError::ExistingName("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn ledger_validation_maps_to_422() {
        let res = ServerError::from(LedgerError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn ledger_bad_cursor_maps_to_400() {
        let res = ServerError::from(LedgerError::InvalidCursor("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ledger_storage_maps_to_500() {
        let res =
            ServerError::from(LedgerError::Storage(sea_orm::DbErr::RecordNotInserted)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
