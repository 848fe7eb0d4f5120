use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::VideoError;

/// 请求级取消标记，可跨线程克隆
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), VideoError> {
        if self.is_cancelled() {
            Err(VideoError::Cancelled)
        } else {
            Ok(())
        }
    }
}
