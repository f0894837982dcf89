use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;

use crate::domain::FieldType;
use crate::domain::SubscriptionRequest;
use crate::utils::error_chain_fmt;

/// A merge field as Mailchimp describes it
#[derive(Debug, Clone, Deserialize)]
pub struct MergeFieldRecord {
    pub tag: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub public: bool,
}

/// Result of looking up an address on a list. `code` is `None` when the
/// response had no recognisable status/error structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberLookup {
    pub code: Option<u16>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeResponse {
    Accepted,
    /// Mailchimp refused the write; carries its error title
    Rejected(String),
}

/// Transport-level failure: connection refused, timeout, undecodable body.
/// Never a business outcome.
#[derive(thiserror::Error)]
#[error("Mailchimp could not be reached")]
pub struct ProviderUnavailable(#[source] pub anyhow::Error);

impl std::fmt::Debug for ProviderUnavailable {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<reqwest::Error> for ProviderUnavailable {
    fn from(e: reqwest::Error) -> Self { Self(e.into()) }
}

/// The three calls the widget makes against the mailing-list provider
#[async_trait]
pub trait ListProvider: Send + Sync {
    async fn fetch_merge_fields(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
    ) -> Result<Vec<MergeFieldRecord>, ProviderUnavailable>;

    async fn lookup_member(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        email: &str,
    ) -> Result<MemberLookup, ProviderUnavailable>;

    async fn subscribe(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        request: &SubscriptionRequest,
        double_opt_in: bool,
    ) -> Result<SubscribeResponse, ProviderUnavailable>;
}

// the connection pool lives in `Client`, so one `MailchimpClient` should be
// built at startup and shared (via `web::Data`) by all workers
pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
}

impl MailchimpClient {
    pub fn new(
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn list_url(
        &self,
        list_id: &str,
        rest: &str,
    ) -> String {
        format!(
            "{}/lists/{}/{rest}",
            self.base_url,
            urlencoding::encode(list_id)
        )
    }
}

#[derive(Deserialize)]
struct MergeFieldsBody {
    merge_fields: Vec<MergeFieldRecord>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    code: Option<u16>,
    error: Option<String>,
}

/// Either `{"code": .., "error": ..}` or `{"errors": [{"code": .., "error": ..}]}`
#[derive(Deserialize)]
struct LookupBody {
    #[serde(flatten)]
    top: ErrorEntry,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

impl From<LookupBody> for MemberLookup {
    fn from(body: LookupBody) -> Self {
        let entry = match body.top.code {
            Some(_) => body.top,
            None => match body.errors.into_iter().find(|e| e.code.is_some()) {
                Some(e) => e,
                None => body.top,
            },
        };
        Self {
            code: entry.code,
            message: entry.error,
        }
    }
}

#[derive(Serialize)]
struct SubscribeBody<'a> {
    email_address: &'a str,
    /// `pending` makes Mailchimp send the opt-in confirmation email
    status: &'static str,
    #[serde(skip_serializing_if = "no_merge_fields")]
    merge_fields: &'a BTreeMap<String, String>,
}

fn no_merge_fields(merge_fields: &&BTreeMap<String, String>) -> bool { merge_fields.is_empty() }

#[derive(Deserialize)]
struct RejectionBody {
    title: Option<String>,
    detail: Option<String>,
}

#[async_trait]
impl ListProvider for MailchimpClient {
    #[tracing::instrument(name = "Fetching merge fields", skip(self, api_key))]
    async fn fetch_merge_fields(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
    ) -> Result<Vec<MergeFieldRecord>, ProviderUnavailable> {
        let body: MergeFieldsBody = self
            .http_client
            .get(self.list_url(list_id, "merge-fields"))
            .basic_auth("apikey", Some(api_key.expose_secret()))
            // merge fields are paginated (10 by default)
            .query(&[("count", "1000")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.merge_fields)
    }

    #[tracing::instrument(name = "Looking up list member", skip(self, api_key))]
    async fn lookup_member(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        email: &str,
    ) -> Result<MemberLookup, ProviderUnavailable> {
        // "not a member" comes back as a 4xx with a code in the body, so the
        // status itself says nothing
        let text = self
            .http_client
            .get(self.list_url(
                list_id,
                &format!("members/{}", urlencoding::encode(email)),
            ))
            .basic_auth("apikey", Some(api_key.expose_secret()))
            .send()
            .await?
            .text()
            .await?;

        let lookup = match serde_json::from_str::<LookupBody>(&text) {
            Ok(body) => body.into(),
            Err(e) => {
                tracing::warn!(error.message = %e, "member lookup body not understood");
                MemberLookup::default()
            }
        };
        Ok(lookup)
    }

    #[tracing::instrument(
        name = "Subscribing list member",
        skip(self, api_key, request),
        fields(subscriber_email = %request.email)
    )]
    async fn subscribe(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        request: &SubscriptionRequest,
        double_opt_in: bool,
    ) -> Result<SubscribeResponse, ProviderUnavailable> {
        let body = SubscribeBody {
            email_address: request.email.as_ref(),
            status: match double_opt_in {
                true => "pending",
                false => "subscribed",
            },
            merge_fields: &request.merge_fields,
        };

        let resp = self
            .http_client
            .post(self.list_url(list_id, "members"))
            .basic_auth("apikey", Some(api_key.expose_secret()))
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(SubscribeResponse::Accepted);
        }

        let status = resp.status();
        let text = resp
            .text()
            .await
            .context("could not read rejection body")
            .map_err(ProviderUnavailable)?;
        let message = serde_json::from_str::<RejectionBody>(&text)
            .ok()
            .and_then(|b| b.title.or(b.detail))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::warn!(%status, %message, "subscribe rejected");
        Ok(SubscribeResponse::Rejected(message))
    }
}
