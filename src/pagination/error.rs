/// Failures raised by the paginator and its layout queries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaginationError {
    #[error("invalid pagination configuration: {0}")]
    InvalidConfiguration(String),
    #[error("layout is not ready; pagination has not finished")]
    LayoutNotReady,
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },
    #[error("file was never measured: {0}")]
    FileNotFound(String),
    #[error("measuring {path} failed: {reason}")]
    MeasurementFailed { path: String, reason: String },
    #[error("unexpected measurement for file #{got} (expected {expected:?})")]
    UnexpectedMeasurement { expected: Option<usize>, got: usize },
}
