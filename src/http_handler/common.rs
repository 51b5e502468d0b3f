use super::http_request::request_common::RequestError;
use super::http_response::response_common::ResponseError;
use std::fmt;

/// Any failure of a round trip to the gateway.
#[derive(Debug)]
pub enum HTTPError {
    HTTPRequestError(RequestError),
    HTTPResponseError(ResponseError),
}

impl fmt::Display for HTTPError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HTTPError::HTTPRequestError(err) => write!(f, "request error: {err}"),
            HTTPError::HTTPResponseError(err) => write!(f, "response error: {err}"),
        }
    }
}

impl std::error::Error for HTTPError {}

impl From<RequestError> for HTTPError {
    fn from(value: RequestError) -> Self { HTTPError::HTTPRequestError(value) }
}

impl From<ResponseError> for HTTPError {
    fn from(value: ResponseError) -> Self { HTTPError::HTTPResponseError(value) }
}
