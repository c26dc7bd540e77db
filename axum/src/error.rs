use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nodnod::ComposeError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error a composition returns to abort the request with a given status.
///
/// ```
/// use axum::http::StatusCode;
/// use nodnod::{Context, Node, Result};
/// use nodnod_axum::{HttpError, RequestHead};
///
/// struct CurrentUser;
/// impl Node for CurrentUser {
///   type Output = String;
///   async fn compose(ctx: &Context<'_>) -> Result<String> {
///     let head = ctx.get::<RequestHead>()?;
///     match head.header("x-user") {
///       Some(user) => Ok(user.to_owned()),
///       None => Err(HttpError::new(StatusCode::UNAUTHORIZED).into()),
///     }
///   }
/// }
/// ```
#[derive(Clone, Debug, Error)]
#[error("{} {}", .status.as_u16(), .detail)]
pub struct HttpError {
  status: StatusCode,
  detail: String,
}

impl HttpError {
  /// An error with the status' canonical reason as its detail.
  pub fn new(status: StatusCode) -> Self {
    Self {
      status,
      detail: status.canonical_reason().unwrap_or("Error").to_owned(),
    }
  }

  pub fn with_detail(status: StatusCode, detail: impl Into<String>) -> Self {
    Self {
      status,
      detail: detail.into(),
    }
  }

  pub fn status(&self) -> StatusCode {
    self.status
  }

  pub fn detail(&self) -> &str {
    &self.detail
  }
}

impl From<HttpError> for ComposeError {
  fn from(err: HttpError) -> Self {
    ComposeError::custom(err)
  }
}

impl IntoResponse for HttpError {
  fn into_response(self) -> Response {
    (self.status, Json(json!({ "detail": self.detail }))).into_response()
  }
}

/// Rejection of the node extractors.
///
/// Carries the resolution error exactly as the node engine produced it. Take
/// `Result<Inject<N>, NodeRejection>` as a handler argument to handle it
/// yourself instead of using the default response.
#[derive(Debug, Error)]
pub enum NodeRejection {
  #[error(transparent)]
  Compose(#[from] ComposeError),

  /// A node extractor was used on a route without `NodeRouteLayer`.
  #[error("no node scope on this request; is the route missing `nodnod_route()`?")]
  MissingLayer,
}

impl NodeRejection {
  pub fn compose_error(&self) -> Option<&ComposeError> {
    match self {
      NodeRejection::Compose(err) => Some(err),
      NodeRejection::MissingLayer => None,
    }
  }

  pub fn into_compose_error(self) -> Option<ComposeError> {
    match self {
      NodeRejection::Compose(err) => Some(err),
      NodeRejection::MissingLayer => None,
    }
  }

  /// The `HttpError` a composition failed with, if that is what happened.
  pub fn http_error(&self) -> Option<&HttpError> {
    self.compose_error()?.source_as::<HttpError>()
  }

  pub fn status(&self) -> StatusCode {
    match self.http_error() {
      Some(http) => http.status(),
      None => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for NodeRejection {
  fn into_response(self) -> Response {
    if let Some(http) = self.http_error() {
      return http.clone().into_response();
    }
    error!(error = %self, "node resolution failed");
    (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(json!({ "detail": self.to_string() })),
    )
      .into_response()
  }
}
