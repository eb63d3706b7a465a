//! Control-plane client
//!
//! `QuickSightApi` is the seam the resource handler depends on. `HttpClient`
//! is the production implementation: JSON over HTTPS against the regional
//! endpoint, SigV4-signed. Tests substitute scripted fakes.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::{ERROR_TYPE_HEADER, REQUEST_ID_HEADER, RESOURCE_NOT_FOUND, SERVICE_NAME};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::sigv4::{self, SigningParams};
use crate::types::{
    CreateAccountSubscriptionInput, CreateAccountSubscriptionOutput,
    DeleteAccountSubscriptionInput, DeleteAccountSubscriptionOutput,
    DescribeAccountSubscriptionInput, DescribeAccountSubscriptionOutput,
};

/// Boxed future returned by `QuickSightApi` methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The three account subscription calls.
///
/// Uses boxed futures so the trait stays dyn-compatible and can be held as
/// `Arc<dyn QuickSightApi>`.
pub trait QuickSightApi: Send + Sync {
    fn create_account_subscription<'a>(
        &'a self,
        input: &'a CreateAccountSubscriptionInput,
    ) -> ApiFuture<'a, CreateAccountSubscriptionOutput>;

    fn describe_account_subscription<'a>(
        &'a self,
        input: &'a DescribeAccountSubscriptionInput,
    ) -> ApiFuture<'a, DescribeAccountSubscriptionOutput>;

    fn delete_account_subscription<'a>(
        &'a self,
        input: &'a DeleteAccountSubscriptionInput,
    ) -> ApiFuture<'a, DeleteAccountSubscriptionOutput>;
}

/// Raw response of one call before the typed output is finished off.
struct Reply<O> {
    output: O,
    status: u16,
    request_id: Option<String>,
}

/// Signed JSON client for the account subscription API.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    endpoint: String,
    region: String,
    credentials: Credentials,
}

impl HttpClient {
    /// Client for the default regional endpoint.
    pub fn new(http: reqwest::Client, region: impl Into<String>, credentials: Credentials) -> Self {
        let region = region.into();
        Self {
            http,
            endpoint: crate::constants::default_endpoint(&region),
            region,
            credentials,
        }
    }

    /// Override the endpoint, e.g. for a local stand-in.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn account_url(&self, account_id: &str) -> Result<Url> {
        if account_id.is_empty() {
            return Err(Error::InvalidRequest("AwsAccountId is required".into()));
        }
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| Error::InvalidRequest(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidRequest(format!("endpoint cannot be a base: {}", self.endpoint)))?
            .pop_if_empty()
            .push("account")
            .push(account_id);
        Ok(url)
    }

    async fn call<O: DeserializeOwned + Default>(
        &self,
        operation: &'static str,
        method: Method,
        account_id: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Reply<O>> {
        let url = self.account_url(account_id)?;
        debug!(operation, %method, %url, "calling control plane");

        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(body) = &body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body.clone());
        }
        let mut request = builder
            .build()
            .map_err(|e| Error::InvalidRequest(format!("{operation}: {e}")))?;

        sigv4::sign(
            method.as_str(),
            &url,
            request.headers_mut(),
            body.as_deref().unwrap_or_default(),
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: SERVICE_NAME,
                time: chrono::Utc::now(),
            },
        )?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| Error::Http(format!("{operation} request failed: {e}")))?;

        decode(operation, response).await
    }
}

/// Serialize an input for the body, dropping the path-bound account id.
fn json_body<T: Serialize>(input: &T) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(input)
        .map_err(|e| Error::InvalidRequest(format!("cannot encode request: {e}")))?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("AwsAccountId");
    }
    serde_json::to_vec(&value).map_err(|e| Error::InvalidRequest(format!("cannot encode request: {e}")))
}

async fn decode<O: DeserializeOwned + Default>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<Reply<O>> {
    let status = response.status();
    let headers = response.headers().clone();
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("{operation} response body: {e}")))?;

    if status.is_success() {
        let output = if bytes.iter().all(u8::is_ascii_whitespace) {
            O::default()
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| Error::Decode(format!("{operation}: {e}")))?
        };
        return Ok(Reply {
            output,
            status: status.as_u16(),
            request_id,
        });
    }

    let body: Option<serde_json::Value> = serde_json::from_slice(&bytes).ok();
    let field = |names: &[&str]| -> Option<String> {
        let obj = body.as_ref()?.as_object()?;
        names
            .iter()
            .find_map(|n| obj.get(*n).and_then(|v| v.as_str()))
            .map(str::to_owned)
    };

    let code = headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(':').next().unwrap_or(v).trim().to_owned())
        .filter(|v| !v.is_empty())
        .or_else(|| field(&["__type", "code", "Code"]))
        .map(|c| c.rsplit('#').next().unwrap_or(&c).to_owned())
        .filter(|c| !c.is_empty());
    let code = match code {
        Some(code) => code,
        None if status.as_u16() == 404 => RESOURCE_NOT_FOUND.to_owned(),
        None => format!("Http{}", status.as_u16()),
    };
    let message = field(&["message", "Message"]).unwrap_or_else(|| {
        let text = String::from_utf8_lossy(&bytes).trim().to_owned();
        if text.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_owned()
        } else {
            text
        }
    });

    Err(Error::Service {
        status: status.as_u16(),
        code,
        message,
        request_id: request_id.or_else(|| field(&["RequestId"])),
    })
}

impl QuickSightApi for HttpClient {
    fn create_account_subscription<'a>(
        &'a self,
        input: &'a CreateAccountSubscriptionInput,
    ) -> ApiFuture<'a, CreateAccountSubscriptionOutput> {
        Box::pin(async move {
            let body = json_body(input)?;
            let reply: Reply<CreateAccountSubscriptionOutput> = self
                .call(
                    "CreateAccountSubscription",
                    Method::POST,
                    &input.aws_account_id,
                    Some(body),
                )
                .await?;
            let mut output = reply.output;
            output.status = Some(reply.status);
            output.request_id = output.request_id.or(reply.request_id);
            Ok(output)
        })
    }

    fn describe_account_subscription<'a>(
        &'a self,
        input: &'a DescribeAccountSubscriptionInput,
    ) -> ApiFuture<'a, DescribeAccountSubscriptionOutput> {
        Box::pin(async move {
            let reply: Reply<DescribeAccountSubscriptionOutput> = self
                .call(
                    "DescribeAccountSubscription",
                    Method::GET,
                    &input.aws_account_id,
                    None,
                )
                .await?;
            let mut output = reply.output;
            output.status = Some(reply.status);
            output.request_id = output.request_id.or(reply.request_id);
            Ok(output)
        })
    }

    fn delete_account_subscription<'a>(
        &'a self,
        input: &'a DeleteAccountSubscriptionInput,
    ) -> ApiFuture<'a, DeleteAccountSubscriptionOutput> {
        Box::pin(async move {
            let reply: Reply<DeleteAccountSubscriptionOutput> = self
                .call(
                    "DeleteAccountSubscription",
                    Method::DELETE,
                    &input.aws_account_id,
                    None,
                )
                .await?;
            let mut output = reply.output;
            output.status = Some(reply.status);
            output.request_id = output.request_id.or(reply.request_id);
            Ok(output)
        })
    }
}
