/// Storage-layer failure shared by every repository port.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// A fetched row decoded, but one of its enum-encoded columns held a
    /// value the domain does not know.
    #[error("row mapping failed: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
