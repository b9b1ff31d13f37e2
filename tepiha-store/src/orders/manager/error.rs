use super::super::limiter::LimitExceeded;
use super::super::storage::StorageError;
use shared::{AppError, ErrorCode};
use thiserror::Error;

/// Manager errors
///
/// `ClientLimitExceeded` is the only condition a caller is expected to act
/// on. Storage and remote variants are environment faults.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Client limit exceeded: {count} active (max {max})")]
    ClientLimitExceeded { count: usize, max: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote sync failed: {0}")]
    Remote(AppError),
}

impl From<LimitExceeded> for ManagerError {
    fn from(e: LimitExceeded) -> Self {
        ManagerError::ClientLimitExceeded {
            count: e.count,
            max: e.max,
        }
    }
}

/// 将存储错误转换为错误码（UI 负责本地化）
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    if let StorageError::Serialization(_) = e {
        return ErrorCode::InternalError;
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }
    ErrorCode::StorageError
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::ClientLimitExceeded { count, max } => {
                AppError::client_limit_exceeded(count, max)
            }
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                AppError::with_message(code, e.to_string())
            }
            ManagerError::Remote(e) => e,
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
