use super::response_common::{HTTPResponseType, ResponseError};

/// mav2rest acknowledges posted messages with a short plain text body.
#[derive(Debug)]
pub struct LandingTargetResponse {}

impl HTTPResponseType for LandingTargetResponse {
    type ParsedResponseType = String;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let response = Self::unwrap_return_code(response).await?;
        Ok(response.text().await?)
    }
}
