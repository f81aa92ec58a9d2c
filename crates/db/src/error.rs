//! Mapping of driver errors onto [`SchedulerError`].

use jobwatch_core::ports::SchedulerError;
use tiberius::error::Error;

/// SQL Server error numbers raised when the login lacks a permission.
///
/// - 229/230: object or column permission denied
/// - 262: statement permission denied in the database
/// - 297: user does not have permission to perform the action
/// - 300: server-level permission (e.g. `VIEW SERVER STATE`) denied
/// - 916: server principal cannot access the database
const PERMISSION_ERRORS: [u32; 6] = [229, 230, 262, 297, 300, 916];

pub fn is_permission_code(code: u32) -> bool {
    PERMISSION_ERRORS.contains(&code)
}

/// Classify a driver error so callers can decide whether to degrade.
pub fn classify(err: Error) -> SchedulerError {
    match &err {
        Error::Server(token) if is_permission_code(token.code()) => {
            SchedulerError::PermissionDenied(token.message().to_string())
        }
        Error::Io { .. } | Error::Routing { .. } | Error::Tls(_) => {
            SchedulerError::Connection(err.to_string())
        }
        _ => SchedulerError::Query(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
