use crate::{
    data::{RequestData, ResponseData},
    error::Error,
    util,
};
use async_trait::async_trait;
use hyper::{body, Body, Request};
use hyper_tls::HttpsConnector;
use std::fmt::Debug;

/// The outbound HTTP seam used by the provider verifier; swap it out in
/// tests to fake provider behavior without a socket.
#[async_trait]
pub trait HttpClient: Debug {
    async fn make_request(
        &self,
        base_url: &str,
        request_data: &RequestData,
    ) -> Result<ResponseData, Error>;
}

#[derive(Debug)]
pub struct HyperHttpClient {}

impl HyperHttpClient {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn make_request(
        &self,
        base_url: &str,
        request_data: &RequestData,
    ) -> Result<ResponseData, Error> {
        let url = format!("{}{}", base_url, request_data.uri);
        let mut request_builder = Request::builder()
            .uri(url.as_str())
            .method(request_data.method.as_str());

        if let Some(headers_mut) = request_builder.headers_mut() {
            util::put_headers(
                headers_mut,
                request_data
                    .headers
                    .iter()
                    .filter(|(header_name, _)| !header_name.eq_ignore_ascii_case("host")),
            )?;
        }

        let request: Request<Body> = request_builder.body(request_data.body.clone().into())?;

        let client = hyper::Client::builder().build(HttpsConnector::new());

        let response = client.request(request).await?;

        let status_code = response.status().as_u16();
        let headers = util::extract_headers(response.headers());
        let body = body::to_bytes(response.into_body()).await?;
        let body: String = String::from_utf8_lossy(&body).into();

        Ok(ResponseData {
            status_code,
            body,
            headers,
        })
    }
}

impl Default for HyperHttpClient {
    fn default() -> Self {
        Self::new()
    }
}
