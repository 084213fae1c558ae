//! HTTP plumbing for the model backend: client construction from
//! transport options and request/response logging at debug level.

use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let TransportOptions::Http { timeout, proxy, .. } = transport_options;

    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(*timeout);
    }
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            ClientError::Config(format!("invalid proxy url {}: {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(ClientError::from)
}

/// Apply any extra headers configured on the transport.
pub fn apply_extra_headers(
    mut request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    let TransportOptions::Http { headers, .. } = transport_options;
    if let Some(headers) = headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Attach a JSON body, logging it first.
pub fn json_body<T: serde::Serialize + ?Sized>(
    request: RequestBuilder,
    body: &T,
) -> RequestBuilder {
    if let Ok(text) = serde_json::to_string_pretty(body) {
        debug!("request body ({} bytes):\n{}", text.len(), text);
    }
    request.json(body)
}

/// Read the response body as text, logging it.
pub async fn read_text(response: Response) -> Result<String, ClientError> {
    let text = response.text().await?;
    debug!("response body ({} bytes):\n{}", text.len(), text);
    Ok(text)
}

/// Read and parse the response body as JSON, logging the raw text.
pub async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if let Ok(text) = std::str::from_utf8(&bytes) {
        debug!("response body ({} bytes):\n{}", text.len(), text);
    }
    serde_json::from_slice(&bytes).map_err(ClientError::from)
}
