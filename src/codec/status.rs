//! Response status handling

use crate::core::error::ProtocolError;
use crate::proto::common::{ErrorCode, Status};

/// A missing status is treated as success, matching the proto3 default.
pub fn ensure_status_ok(status: Option<&Status>) -> Result<(), ProtocolError> {
    match status {
        Some(status) if status.error_code != ErrorCode::Success as i32 => Err(ProtocolError {
            code: status.error_code,
            reason: status.reason.clone(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_surfaced_verbatim() {
        let status = Status::failure(ErrorCode::IllegalTopk, "topk [0] is invalid, should be in range [1, 16384]");
        let err = ensure_status_ok(Some(&status)).unwrap_err();

        assert_eq!(err.code, ErrorCode::IllegalTopk as i32);
        assert_eq!(err.to_string(), "topk [0] is invalid, should be in range [1, 16384]");
    }

    #[test]
    fn test_success_and_absent_status() {
        assert!(ensure_status_ok(Some(&Status::success())).is_ok());
        assert!(ensure_status_ok(None).is_ok());
    }
}
