pub(crate) mod common;
pub(crate) mod http_client;
pub(crate) mod http_request;
pub(crate) mod http_response;
mod mavlink_gateway;

pub(crate) use mavlink_gateway::MavlinkGateway;

#[cfg(test)]
mod tests;
