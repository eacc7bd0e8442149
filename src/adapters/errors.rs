//! Collaborator errors: quote sources, rate provider, alert delivery

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected status {status} from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Field '{field}' is not a number: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Source {source_name} returned no quote for {symbol}")]
    MissingSymbol { source_name: String, symbol: String },
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        AdapterError::Request(e.to_string())
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = AdapterError::Status {
            url: "http://x/ticker".into(),
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Unexpected status 502 from http://x/ticker: bad gateway");
    }

    #[test]
    fn test_missing_symbol_display() {
        let err = AdapterError::MissingSymbol {
            source_name: "Koineks".into(),
            symbol: "DOGE".into(),
        };
        assert!(err.to_string().contains("Koineks"));
        assert!(err.to_string().contains("DOGE"));
    }
}
