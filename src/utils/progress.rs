//! Progress tracking utility
//!
//! Logs throughput for long transfers without tying the caller to a UI.

use std::time::Instant;

use super::bytes_to_mb;
use crate::{log_debug, log_info};

/// Progress tracker for operations with speed calculation
pub struct ProgressTracker {
    /// Operation name for logging (e.g., "Download", "Extract")
    operation_name: String,
    /// Log target
    module_name: &'static str,
    /// Total bytes to process (0 if unknown)
    total_bytes: u64,
    processed_bytes: u64,
    start_time: Instant,
    last_log_time: Instant,
    last_log_bytes: u64,
    /// Interval in bytes between progress logs
    log_interval_bytes: u64,
}

/// Final summary data
#[derive(Debug, Clone, Copy)]
pub struct ProgressSummary {
    pub total_bytes: u64,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `operation` - Name of the operation (e.g., "Download")
    /// * `module` - Log target
    /// * `total_bytes` - Total bytes to process (0 if unknown)
    /// * `log_interval_mb` - Interval in MB between progress logs
    pub fn new(operation: &str, module: &'static str, total_bytes: u64, log_interval_mb: u64) -> Self {
        let now = Instant::now();
        Self {
            operation_name: operation.to_string(),
            module_name: module,
            total_bytes,
            processed_bytes: 0,
            start_time: now,
            last_log_time: now,
            last_log_bytes: 0,
            log_interval_bytes: log_interval_mb * 1024 * 1024,
        }
    }

    /// Record `bytes_added` and log once per interval boundary crossed
    pub fn update(&mut self, bytes_added: u64) {
        self.processed_bytes += bytes_added;

        if self.log_interval_bytes == 0 {
            return;
        }

        let current_interval = self.processed_bytes / self.log_interval_bytes;
        let last_interval = self.last_log_bytes / self.log_interval_bytes;
        if current_interval <= last_interval {
            return;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_log_time).as_secs_f64();
        let speed_mbps = if elapsed > 0.0 {
            bytes_to_mb(self.processed_bytes - self.last_log_bytes) / elapsed
        } else {
            0.0
        };
        self.last_log_time = now;
        self.last_log_bytes = self.processed_bytes;

        if self.total_bytes > 0 {
            let percent = (self.processed_bytes as f64 / self.total_bytes as f64) * 100.0;
            log_debug!(
                self.module_name,
                "{} progress: {:.1} MB / {:.1} MB ({:.1}%) @ {:.1} MB/s",
                self.operation_name,
                bytes_to_mb(self.processed_bytes),
                bytes_to_mb(self.total_bytes),
                percent,
                speed_mbps
            );
        } else {
            log_debug!(
                self.module_name,
                "{} progress: {:.1} MB @ {:.1} MB/s",
                self.operation_name,
                bytes_to_mb(self.processed_bytes),
                speed_mbps
            );
        }
    }

    /// Log completion and return the average speed
    pub fn finish(&self) -> ProgressSummary {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let total_mb = bytes_to_mb(self.processed_bytes);
        let avg_speed_mbps = if elapsed_secs > 0.0 {
            total_mb / elapsed_secs
        } else {
            0.0
        };

        log_info!(
            self.module_name,
            "{} complete: {:.1} MB in {:.1}s (avg {:.1} MB/s)",
            self.operation_name,
            total_mb,
            elapsed_secs,
            avg_speed_mbps
        );

        ProgressSummary {
            total_bytes: self.processed_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_counts_bytes() {
        let mut tracker = ProgressTracker::new("Download", "test", 3 * 1024 * 1024, 1);
        tracker.update(1024 * 1024);
        tracker.update(2 * 1024 * 1024);
        assert_eq!(tracker.finish().total_bytes, 3 * 1024 * 1024);
    }

    #[test]
    fn test_zero_interval_never_divides() {
        let mut tracker = ProgressTracker::new("Download", "test", 0, 0);
        tracker.update(42);
        assert_eq!(tracker.finish().total_bytes, 42);
    }
}
