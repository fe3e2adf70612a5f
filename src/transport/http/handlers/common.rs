use crate::domain::context::{check_actor, RequestContext, Role};
use crate::transport::http::types::{error_response, ApiResponse};
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const ROLE_HEADER: &str = "x-role";
pub const ACTOR_HEADER: &str = "x-actor";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds the caller context from `x-role` / `x-actor`.
///
/// A missing role means guest. An unknown role or an overlong actor is a 400.
pub fn request_context(headers: &HeaderMap) -> Result<RequestContext, Response> {
    let role = match header_str(headers, ROLE_HEADER) {
        Some(raw) => raw.parse::<Role>().map_err(|e| error_response(&e))?,
        None => Role::Guest,
    };
    let mut ctx = match role {
        Role::Admin => RequestContext::admin(),
        Role::Guest => RequestContext::guest(),
    };
    if let Some(actor) = header_str(headers, ACTOR_HEADER) {
        check_actor(actor).map_err(|e| error_response(&e))?;
        ctx.actor = actor.to_string();
    }
    Ok(ctx)
}

/// Unwraps a JSON body, turning extractor rejections into the usual envelope.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>, expected: &str) -> Result<T, Response> {
    match body {
        Ok(Json(v)) => Ok(v),
        Err(e) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::failure(
                format!("Invalid JSON body: {} (expected: {})", e, expected),
                None,
            )),
        )
            .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_role_header_means_guest() {
        let ctx = request_context(&HeaderMap::new()).unwrap_or_else(|_| panic!("rejected"));
        assert_eq!(ctx.role, Role::Guest);
    }

    #[test]
    fn actor_header_overrides_default_actor() {
        let mut headers = HeaderMap::new();
        headers.insert(ROLE_HEADER, HeaderValue::from_static("Admin"));
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("steward-7"));
        let ctx = request_context(&headers).unwrap_or_else(|_| panic!("rejected"));
        assert_eq!(ctx.role, Role::Admin);
        assert_eq!(ctx.actor, "steward-7");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ROLE_HEADER, HeaderValue::from_static("jockey"));
        let Err(resp) = request_context(&headers) else {
            panic!("unknown role accepted");
        };
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn overlong_actor_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ROLE_HEADER, HeaderValue::from_static("admin"));
        let actor = "s".repeat(51);
        headers.insert(
            ACTOR_HEADER,
            HeaderValue::from_str(&actor).unwrap_or_else(|_| panic!("bad header")),
        );
        let Err(resp) = request_context(&headers) else {
            panic!("overlong actor accepted");
        };
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
