use std::fmt;

pub(crate) trait HTTPResponseType {
    type ParsedResponseType;
    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>;

    async fn unwrap_return_code(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ResponseError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status.is_server_error() {
            Err(ResponseError::InternalServer)
        } else if status.is_client_error() {
            // mav2rest answers rejected messages with a plain text reason
            Err(ResponseError::BadRequest(response.text().await.unwrap_or_default()))
        } else {
            Err(ResponseError::Unknown)
        }
    }
}

/// Marker for responses whose json body maps directly onto `Self`.
pub(crate) trait SerdeJSONBodyHTTPResponseType {}

impl<T> HTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
    type ParsedResponseType = T;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let resp = Self::unwrap_return_code(response).await?;
        Ok(resp.json::<Self::ParsedResponseType>().await?)
    }
}

#[derive(Debug)]
pub enum ResponseError {
    InternalServer,
    BadRequest(String),
    NoConnection,
    Timeout,
    MalformedBody,
    Unknown,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseError::InternalServer => write!(f, "gateway reported an internal error"),
            ResponseError::BadRequest(reason) => write!(f, "gateway rejected request: {reason}"),
            ResponseError::NoConnection => write!(f, "gateway unreachable"),
            ResponseError::Timeout => write!(f, "gateway did not answer in time"),
            ResponseError::MalformedBody => write!(f, "gateway answer could not be parsed"),
            ResponseError::Unknown => write!(f, "unknown gateway failure"),
        }
    }
}

impl std::error::Error for ResponseError {}

impl From<reqwest::Error> for ResponseError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ResponseError::Timeout
        } else if value.is_connect() {
            ResponseError::NoConnection
        } else if value.is_decode() {
            ResponseError::MalformedBody
        } else if value.is_status() {
            ResponseError::InternalServer
        } else {
            ResponseError::Unknown
        }
    }
}
