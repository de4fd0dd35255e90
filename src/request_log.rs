//! Access log middleware: one line per request with status and latency.

use crate::error::ConfigError;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug, Default)]
pub struct RequestLog {
    ignored: Option<Arc<Regex>>,
}

impl RequestLog {
    /// Compile ignored path specs: `/exact`, `/prefix/*` or `*.suffix`.
    pub fn new(specs: &[String]) -> Result<Self, ConfigError> {
        if specs.is_empty() {
            return Ok(Self::default());
        }
        let mut alternatives = Vec::with_capacity(specs.len());
        for spec in specs {
            if !(spec.starts_with('/') || spec.starts_with('*')) {
                return Err(ConfigError::InvalidPathSpec {
                    spec: spec.clone(),
                    reason: "must start with '/' or '*'".into(),
                });
            }
            let pattern = spec
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            alternatives.push(pattern);
        }
        let regex = Regex::new(&format!("^(?:{})$", alternatives.join("|"))).map_err(|e| {
            ConfigError::InvalidPathSpec {
                spec: specs.join(", "),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            ignored: Some(Arc::new(regex)),
        })
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.as_ref().is_some_and(|r| r.is_match(path))
    }
}

/// Use with `axum::middleware::from_fn_with_state(request_log, log_requests)`.
pub async fn log_requests(State(log): State<RequestLog>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if log.is_ignored(&path) {
        return next.run(request).await;
    }

    let id = Uuid::new_v4();
    let method = request.method().clone();
    let span = tracing::info_span!("request", %id, %method, %path);
    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    span.in_scope(|| {
        if status >= 500 {
            tracing::warn!(status, latency_ms, "request completed");
        } else {
            tracing::info!(status, latency_ms, "request completed");
        }
    });
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_exact_prefix_and_suffix_specs() {
        let log = RequestLog::new(&specs(&["/health", "/static/*", "*.css"])).unwrap();
        assert!(log.is_ignored("/health"));
        assert!(!log.is_ignored("/healthz"));
        assert!(log.is_ignored("/static/img/logo.png"));
        assert!(log.is_ignored("/theme/site.css"));
        assert!(!log.is_ignored("/widget/dingo"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let log = RequestLog::new(&specs(&["/v1.0/status"])).unwrap();
        assert!(log.is_ignored("/v1.0/status"));
        assert!(!log.is_ignored("/v100/status"));
    }

    #[test]
    fn nothing_is_ignored_by_default() {
        let log = RequestLog::new(&[]).unwrap();
        assert!(!log.is_ignored("/health"));
    }

    #[test]
    fn rejects_relative_specs() {
        assert!(matches!(
            RequestLog::new(&specs(&["health"])),
            Err(ConfigError::InvalidPathSpec { .. })
        ));
    }
}
