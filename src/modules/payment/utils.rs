use axum::http::Method;
use serde::de::DeserializeOwned;

pub struct SendRequestPayload<'a> {
    pub base_url: &'a str,
    pub secret_key: &'a str,
    pub route: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub query: Option<&'a [(&'a str, &'a str)]>,
}

#[derive(Debug)]
pub enum Error {
    RequestNotSent,
    InvalidHttpResponseStatusCode,
    FailedToDecodeResponse,
}

/// Sends an authenticated JSON request to a payment provider and decodes the reply.
pub async fn send_request<'a, R: DeserializeOwned>(
    client: &reqwest::Client,
    payload: SendRequestPayload<'a>,
) -> Result<R, Error> {
    let url = format!("{}{}", payload.base_url.trim_end_matches('/'), payload.route);
    let mut req = match payload.method {
        Method::GET => client.get(url),
        _ => client.post(url),
    };

    if let Some(query) = payload.query {
        req = req.query(query);
    }

    if let Some(body) = payload.body {
        req = req.json(&body);
    }

    let res = req
        .bearer_auth(payload.secret_key)
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to send payment provider request: {}", err);
            Error::RequestNotSent
        })?;

    let status = res.status();
    let data = res.text().await.map_err(|err| {
        tracing::error!("Failed to read payment provider response: {}", err);
        Error::FailedToDecodeResponse
    })?;

    if !status.is_success() {
        tracing::error!(
            "Got unexpected http response status {} from payment provider: {}",
            status,
            data
        );
        return Err(Error::InvalidHttpResponseStatusCode);
    }

    tracing::debug!("Response received from payment provider: {}", data);

    serde_json::from_str::<R>(&data).map_err(|err| {
        tracing::error!("Failed to decode payment provider response: {}", err);
        Error::FailedToDecodeResponse
    })
}
