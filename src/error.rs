//! Error taxonomy for the edge service.
//!
//! Configuration errors are fatal at start-up, adapter errors are per auction,
//! dispatch errors belong to the transport that talks to the exchange.

use thiserror::Error;

/// Failures while turning raw configuration bytes into a bidder.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing PBS config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} adapter is not enabled in config")]
    Disabled(&'static str),
}

/// Coarse classification used by the auction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// We could not build a valid wire request.
    RequestConstruction,
    /// The exchange answered with a rejecting status.
    ExchangeRejected,
    /// The exchange answered 200 with a body we cannot decode.
    ExchangeGarbage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RequestConstruction => "request_construction",
            ErrorKind::ExchangeRejected => "exchange_rejected",
            ErrorKind::ExchangeGarbage => "exchange_garbage",
        }
    }
}

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("no impressions in bid request")]
    NoImpressions,

    #[error("error marshaling imp.ext: {0}")]
    ExtensionEncode(#[source] serde_json::Error),

    #[error("error marshaling bid request: {0}")]
    RequestEncode(#[source] serde_json::Error),

    #[error("bad request: {body}")]
    BadRequest { body: String },

    #[error("404 not found: {body}")]
    NotFound { body: String },

    #[error("unexpected status code: {code}. body: {body}")]
    UnexpectedStatus { code: u16, body: String },

    #[error("error decoding bid response: {0}")]
    ResponseDecode(#[source] serde_json::Error),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::NoImpressions
            | AdapterError::ExtensionEncode(_)
            | AdapterError::RequestEncode(_) => ErrorKind::RequestConstruction,
            AdapterError::BadRequest { .. }
            | AdapterError::NotFound { .. }
            | AdapterError::UnexpectedStatus { .. } => ErrorKind::ExchangeRejected,
            AdapterError::ResponseDecode(_) => ErrorKind::ExchangeGarbage,
        }
    }
}

/// Failures of a single send to the exchange.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("failed to send request: {0}")]
    Send(#[source] reqwest::Error),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("failed to read response: {0}")]
    Body(#[source] reqwest::Error),
}

/// Terminal failure of one inbound auction.
#[derive(Error, Debug)]
pub enum AuctionError {
    #[error("failed to make requests: {}", join(.0))]
    MakeRequests(Vec<AdapterError>),

    #[error("no wire request could be sent: {}", join(.0))]
    AllSendsFailed(Vec<DispatchError>),
}

fn join<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_are_classified() {
        assert_eq!(AdapterError::NoImpressions.kind(), ErrorKind::RequestConstruction);
        assert_eq!(
            AdapterError::NotFound { body: String::new() }.kind(),
            ErrorKind::ExchangeRejected
        );
        let garbage = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(AdapterError::ResponseDecode(garbage).kind(), ErrorKind::ExchangeGarbage);
    }

    #[test]
    fn unexpected_status_message_carries_code_and_body() {
        let err = AdapterError::UnexpectedStatus { code: 503, body: "busy".to_string() };
        assert_eq!(err.to_string(), "unexpected status code: 503. body: busy");
    }

    #[test]
    fn auction_error_joins_causes() {
        let err = AuctionError::MakeRequests(vec![AdapterError::NoImpressions]);
        assert_eq!(err.to_string(), "failed to make requests: no impressions in bid request");
    }
}
