use crate::http_handler::{
    common::HTTPError,
    http_client::HTTPClient,
    http_response::response_common::{HTTPResponseType, ResponseError},
};
use std::time::Duration;
use strum_macros::Display;

/// HTTP verbs understood by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HTTPRequestMethod {
    Get,
    Post,
}

impl From<HTTPRequestMethod> for reqwest::Method {
    fn from(value: HTTPRequestMethod) -> Self {
        match value {
            HTTPRequestMethod::Get => reqwest::Method::GET,
            HTTPRequestMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Errors raised before a request leaves the process.
#[derive(Debug, Display)]
pub enum RequestError {
    /// The request body could not be serialized.
    BodySerialization,
}

impl std::error::Error for RequestError {}

/// Common description of an endpoint of the gateway.
pub(crate) trait HTTPRequestType {
    /// Type of the expected response.
    type Response: HTTPResponseType;
    /// Path of the endpoint, relative to the client base URL.
    fn endpoint(&self) -> String;
    /// The corresponding HTTP Request Method.
    fn request_method(&self) -> HTTPRequestMethod;
    /// Additional header parameters.
    fn header_params(&self) -> reqwest::header::HeaderMap { reqwest::header::HeaderMap::default() }
    /// Per request timeout overriding the client default.
    fn timeout(&self) -> Option<Duration> { None }

    fn request_builder(&self, client: &HTTPClient) -> reqwest::RequestBuilder {
        let url = format!("{}{}", client.url(), self.endpoint());
        let builder = client
            .client()
            .request(self.request_method().into(), url)
            .headers(self.header_params());
        match self.timeout() {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

/// Requests without any body.
pub(crate) trait NoBodyHTTPRequestType: HTTPRequestType {
    async fn send_request(
        &self,
        client: &HTTPClient,
    ) -> Result<<Self::Response as HTTPResponseType>::ParsedResponseType, HTTPError> {
        let response =
            self.request_builder(client).send().await.map_err(ResponseError::from)?;
        Ok(Self::Response::read_response(response).await?)
    }
}

/// Requests carrying a json body.
pub(crate) trait JSONBodyHTTPRequestType: HTTPRequestType {
    /// The type of the json body.
    type Body: serde::Serialize;
    /// Returns the serializable object.
    fn body(&self) -> &Self::Body;

    async fn send_request(
        &self,
        client: &HTTPClient,
    ) -> Result<<Self::Response as HTTPResponseType>::ParsedResponseType, HTTPError> {
        let payload =
            serde_json::to_vec(self.body()).map_err(|_| RequestError::BodySerialization)?;
        let response = self
            .request_builder(client)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(ResponseError::from)?;
        Ok(Self::Response::read_response(response).await?)
    }
}
