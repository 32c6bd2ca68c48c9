// file: src/utils/telemetry.rs
// description: backend health reporting and per-stage operation timing

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    pub fn healthy(component: &str, message: Option<String>, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Healthy,
            message,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Degraded,
            message: Some(message),
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self {
            component: component.to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(message),
            response_time_ms: response_time.as_millis() as u64,
        }
    }
}

/// Overall backend health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub timestamp: i64,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            overall_status,
            checks,
            timestamp: chrono::Utc::now().timestamp(),
            version,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall_status == HealthStatus::Healthy
    }

    pub fn format(&self) -> String {
        let mut output = format!(
            "{} Backend Health: {:?}\n\
             Version: {}\n\
             Timestamp: {}\n\n",
            status_icon(&self.overall_status),
            self.overall_status,
            self.version,
            chrono::DateTime::from_timestamp(self.timestamp, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        for check in &self.checks {
            output.push_str(&format!(
                "{} {} ({:?}) - {}ms",
                status_icon(&check.status),
                check.component,
                check.status,
                check.response_time_ms
            ));

            if let Some(ref msg) = check.message {
                output.push_str(&format!("\n  {}", msg));
            }

            output.push('\n');
        }

        output
    }
}

fn status_icon(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "✓",
        HealthStatus::Degraded => "⚠",
        HealthStatus::Unhealthy => "✗",
    }
}

/// Times one gateway call or pipeline stage.
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} in {:.2}s",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: {} took {:.2}s (threshold: {:.2}s)",
                self.operation,
                message,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_creation() {
        let check = HealthCheck::healthy("backend", None, Duration::from_millis(50));
        assert_eq!(check.component, "backend");
        assert_eq!(check.status, HealthStatus::Healthy);
        assert_eq!(check.response_time_ms, 50);
    }

    #[test]
    fn test_health_report_overall_status() {
        let checks = vec![
            HealthCheck::healthy("backend", None, Duration::from_millis(10)),
            HealthCheck::unhealthy("backend", "refused".to_string(), Duration::from_millis(100)),
        ];

        let report = HealthReport::new(checks, "0.1.0".to_string());
        assert_eq!(report.overall_status, HealthStatus::Unhealthy);
        assert!(!report.is_healthy());
        assert!(report.format().contains("refused"));
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }
}
