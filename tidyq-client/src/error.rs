use std::fmt;

/// The management API answered with a status the client doesn't know how to handle.
#[derive(Clone, Debug)]
pub struct ApiError {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} responded with status {}: {}",
            self.method, self.url, self.status, self.body
        )
    }
}

impl std::error::Error for ApiError {}

/// Shorthand for returning an `ApiError` from async functions.
#[macro_export]
macro_rules! api_error {
    ($method:expr, $url:expr, $status:expr, $body:expr) => {
        ::std::result::Result::Err(anyhow::Error::new($crate::error::ApiError {
            method: ::std::string::ToString::to_string(&$method),
            url: ::std::string::ToString::to_string(&$url),
            status: $status,
            body: ::std::string::String::from($body),
        }))
    };
}
