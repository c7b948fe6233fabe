/// Errors raised while parsing user supplied values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown weekday '{0}'")]
    Weekday(String),

    #[error("Unknown scope '{0}', expected one of: day, month, all")]
    Scope(String),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    Month(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD or an RFC 3339 timestamp")]
    Date(String),

    #[error("Invalid time '{0}', expected HH:MM, HH:MM:SS or an RFC 3339 timestamp")]
    Time(String),
}
