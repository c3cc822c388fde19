//! Toolbar injection into HTML responses.

use axum::body::Body;
use axum::response::Response;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::response::Parts;

/// Rebuild a buffered response with the toolbar fragment injected.
///
/// HTML responses get the fragment inserted before the final `</body>`
/// tag, or appended when no such tag exists; anything else is rebuilt
/// unchanged. The `Content-Length` header is dropped so the new body sizes
/// itself.
pub fn inject_toolbar(mut parts: Parts, body: String, toolbar_html: &str) -> Response<Body> {
	let content_type = parts
		.headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("");

	if !content_type.contains("text/html") {
		return Response::from_parts(parts, Body::from(body));
	}

	let injected = match body.rfind("</body>") {
		Some(pos) => format!("{}{}{}", &body[..pos], toolbar_html, &body[pos..]),
		None => format!("{body}{toolbar_html}"),
	};

	parts.headers.remove(CONTENT_LENGTH);
	Response::from_parts(parts, Body::from(injected))
}
