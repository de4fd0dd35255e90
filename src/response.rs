//! Response helpers for application handlers.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// `201 Created` pointing at `location`. An unusable location is left out of the headers.
pub fn created(location: &str) -> Response {
    let mut response = StatusCode::CREATED.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(location, error = %e, "invalid Location header"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_sets_location() {
        let response = created("/widget/dingo");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/widget/dingo");
    }

    #[test]
    fn unusable_location_is_dropped() {
        let response = created("/widget/\n");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
