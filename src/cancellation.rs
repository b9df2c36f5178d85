use anyhow::{Result, anyhow};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared flag checked between measurements so a closed book stops paginating.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(anyhow!("pagination cancelled at stage={stage}"));
        }
        Ok(())
    }

    /// Checked before each measurement so the error names the file that was
    /// never measured.
    pub fn check_before_file(&self, index: usize, path: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(anyhow!(
                "pagination cancelled before measuring file #{index} ({path})"
            ));
        }
        Ok(())
    }
}
