//! Reconnection policy.
//!
//! 副作用を持たない判定のみをまとめ、runner から呼び出す。

use crate::error::ClientError;

/// Whether the client should give up without retrying
///
/// 認証の失敗や不正な URL は再接続しても解決しないため即座に終了する。
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::AuthenticationFailed(_) | ClientError::InvalidUrl(_)
    )
}

/// Whether another connection attempt should be made
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(error: &ClientError, current_attempt: u32, max_attempts: u32) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}
