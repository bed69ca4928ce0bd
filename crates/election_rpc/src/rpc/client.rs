use std::time::Duration;

use jsonrpsee::{core::client::Client, ws_client::WsClientBuilder};

use crate::ApiError;

pub async fn create_client(server_url: &str, request_timeout: Duration) -> crate::Result<Client> {
    if !server_url.starts_with("ws://") && !server_url.starts_with("wss://") {
        return Err(ApiError::InvalidUrl(server_url.to_string()));
    }

    let client = WsClientBuilder::default()
        .request_timeout(request_timeout)
        .connection_timeout(request_timeout)
        .build(server_url)
        .await
        .map_err(|err| ApiError::Other(format!("unable to connect to JSON-RPC server: {err}")))?;

    Ok(client)
}
