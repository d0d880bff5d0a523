pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod filter;
pub mod ingest;
pub mod normalize;
pub mod store;
pub mod table;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("STORE_WRITE_FAILED", "write failed")
            .with_details("path=/tmp/x.csv")
            .with_retryable(false);
        assert_eq!(err.code, "STORE_WRITE_FAILED");
        assert!(err.is("STORE_WRITE_FAILED"));
        assert_eq!(err.details.as_deref(), Some("path=/tmp/x.csv"));
        assert!(!err.retryable);
        assert_eq!(
            err.to_string(),
            "[STORE_WRITE_FAILED] write failed (path=/tmp/x.csv)"
        );
    }
}
