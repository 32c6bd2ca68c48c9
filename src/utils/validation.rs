// file: src/utils/validation.rs
// description: input validation utilities and display helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};

pub const CSV_EXTENSION: &str = ".csv";

pub struct Validator;

impl Validator {
    /// Case-sensitive suffix match, matching what the backend accepts.
    pub fn validate_csv_extension(name: &str) -> Result<()> {
        if name.ends_with(CSV_EXTENSION) {
            Ok(())
        } else {
            Err(PipelineError::Validation("wrong format".to_string()))
        }
    }

    pub fn validate_file_size(size: u64, max_bytes: u64) -> Result<()> {
        if max_bytes > 0 && size > max_bytes {
            return Err(PipelineError::Validation(format!(
                "file too large ({} > {})",
                Self::format_bytes(size),
                Self::format_bytes(max_bytes)
            )));
        }
        Ok(())
    }

    pub fn validate_file_id(file_id: &str) -> Result<()> {
        if file_id.trim().is_empty() {
            return Err(PipelineError::Validation(
                "missing file id".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn truncate_text(text: &str, max_length: usize) -> String {
        if text.chars().count() <= max_length {
            text.to_string()
        } else {
            let truncated: String = text.chars().take(max_length).collect();
            format!("{}...", truncated)
        }
    }

    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
        if bytes == 0 {
            return "0 Bytes".to_string();
        }

        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", bytes, UNITS[0])
        } else {
            format!("{:.2} {}", value, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_csv_extension() {
        assert!(Validator::validate_csv_extension("sales.csv").is_ok());
        assert!(Validator::validate_csv_extension("archive.tar.csv").is_ok());
        assert!(Validator::validate_csv_extension("sales.CSV").is_err());
        assert!(Validator::validate_csv_extension("sales.csv.txt").is_err());
        assert!(Validator::validate_csv_extension("sales.xlsx").is_err());
        assert!(Validator::validate_csv_extension(".csv").is_ok());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(Validator::validate_file_size(1024, 2048).is_ok());
        assert!(Validator::validate_file_size(4096, 2048).is_err());
        assert!(Validator::validate_file_size(u64::MAX, 0).is_ok());
    }

    #[test]
    fn test_validate_file_id() {
        assert!(Validator::validate_file_id("abc123").is_ok());
        assert!(Validator::validate_file_id("").is_err());
        assert!(Validator::validate_file_id("   ").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://example.com").is_ok());
        assert!(Validator::validate_url("http://localhost:8000").is_ok());
        assert!(Validator::validate_url("example.com").is_err());
        assert!(Validator::validate_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(
            Validator::truncate_text("this is a very long text", 10),
            "this is a ..."
        );
        assert_eq!(Validator::truncate_text("ãéíõú", 3), "ãéí...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(Validator::format_bytes(0), "0 Bytes");
        assert_eq!(Validator::format_bytes(512), "512 Bytes");
        assert_eq!(Validator::format_bytes(1536), "1.50 KB");
        assert_eq!(Validator::format_bytes(10 * 1_048_576), "10.00 MB");
    }
}
