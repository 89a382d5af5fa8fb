//! Transient success/error notices

use std::time::Duration;
use tokio::time::Instant;

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A toast shown after a mutation settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    shown_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTICE_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let notice = Notice::success("Saved");
        assert!(!notice.is_expired());

        tokio::time::advance(Duration::from_millis(2_999)).await;
        assert!(!notice.is_expired());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notice.is_expired());
        assert_eq!(notice.kind, NoticeKind::Success);
    }
}
