use serde::Serialize;
use tracing::{error, warn};

use photoshare_shared::{ApiError, ErrorKind};

/// Load state shared by every controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Loading,
    Ready,
    Empty,
    Error,
}

impl ViewStatus {
    pub fn for_count(count: usize) -> Self {
        if count == 0 {
            ViewStatus::Empty
        } else {
            ViewStatus::Ready
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Shown next to the form or list that produced it.
    Inline,
    /// Blocking; the user has to acknowledge it.
    Alert,
}

/// A user-facing message produced by a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn inline(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Inline,
            message: message.into(),
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Alert,
            message: message.into(),
        }
    }

    /// Log a remote failure and turn it into a notice.
    pub fn from_error(action: &str, err: &ApiError, kind: NoticeKind) -> Self {
        match err.kind() {
            ErrorKind::Backend => error!(action, error = %err, "remote call failed"),
            _ => warn!(action, error = %err, "remote call rejected"),
        }
        Self {
            kind,
            message: format!("{action}: {}", user_message(err)),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::Validation(msg) => msg.clone(),
        ApiError::Authorization(msg) => msg.clone(),
        ApiError::NotFound { kind, .. } => format!("{kind} no longer exists"),
        ApiError::Unconfirmed(msg) => msg.clone(),
        ApiError::Backend(_) => "something went wrong, please try again".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_details_stay_out_of_messages() {
        let notice = Notice::from_error(
            "Failed to delete photo",
            &ApiError::backend("disk I/O error at /var/lib"),
            NoticeKind::Alert,
        );
        assert_eq!(notice.kind, NoticeKind::Alert);
        assert!(!notice.message.contains("/var/lib"));
    }

    #[test]
    fn status_for_count() {
        assert_eq!(ViewStatus::for_count(0), ViewStatus::Empty);
        assert_eq!(ViewStatus::for_count(3), ViewStatus::Ready);
    }
}
