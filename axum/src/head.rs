//! A snapshot of the incoming request, made available to nodes.

use axum::http::{header::AsHeaderName, HeaderMap, Method, Request, Uri, Version};

/// Method, URI, version and headers of the request being handled.
///
/// Pushed into every per-request scope, so a node can compose from it with
/// `ctx.get::<RequestHead>()`. The body is not part of the snapshot; it
/// belongs to the handler's own extractors.
#[derive(Clone, Debug)]
pub struct RequestHead {
  pub method: Method,
  pub uri: Uri,
  pub version: Version,
  pub headers: HeaderMap,
}

impl RequestHead {
  pub fn from_request<B>(req: &Request<B>) -> Self {
    Self {
      method: req.method().clone(),
      uri: req.uri().clone(),
      version: req.version(),
      headers: req.headers().clone(),
    }
  }

  pub fn path(&self) -> &str {
    self.uri.path()
  }

  pub fn query(&self) -> Option<&str> {
    self.uri.query()
  }

  /// Returns a header value, if present and valid visible ASCII.
  pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
    self.headers.get(name).and_then(|value| value.to_str().ok())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snapshot_keeps_method_uri_and_headers() {
    let req = Request::builder()
      .method(Method::POST)
      .uri("/projects?limit=5")
      .header("x-tenant", "acme")
      .body(())
      .unwrap();

    let head = RequestHead::from_request(&req);

    assert_eq!(head.method, Method::POST);
    assert_eq!(head.path(), "/projects");
    assert_eq!(head.query(), Some("limit=5"));
    assert_eq!(head.header("x-tenant"), Some("acme"));
    assert_eq!(head.header("x-user"), None);
  }
}
