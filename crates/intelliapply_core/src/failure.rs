use std::fmt;

/// Coarse failure classes the dashboard reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    /// 401/403 after the session refresh attempt.
    Unauthorized,
    Server,
    Malformed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
