use std::collections::HashMap;
use std::sync::Arc;

use secrecy::Secret;

use crate::collaborators::Translator;
use crate::domain::build_form_spec;
use crate::domain::response_code::interpret;
use crate::domain::response_code::LookupVerdict;
use crate::domain::validate_submission;
use crate::domain::FieldSpec;
use crate::domain::SubscriptionOutcome;
use crate::mailchimp_client::ListProvider;
use crate::mailchimp_client::SubscribeResponse;
use crate::schema_cache::ListSchemaCache;
use crate::schema_cache::SchemaCacheError;

/// Ties the schema cache, the form definition and the provider calls together.
/// Nothing in here returns an error to the caller on submit: every path ends
/// in a `SubscriptionOutcome`.
pub struct SubscriptionCoordinator<P> {
    provider: Arc<P>,
    schema_cache: ListSchemaCache<P>,
}

impl<P: ListProvider> SubscriptionCoordinator<P> {
    pub fn new(
        provider: Arc<P>,
        schema_cache: ListSchemaCache<P>,
    ) -> Self {
        Self {
            provider,
            schema_cache,
        }
    }

    pub fn schema_cache(&self) -> &ListSchemaCache<P> { &self.schema_cache }

    /// Form definition for the current (cached) schema of the list
    pub async fn form_spec(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        translator: &dyn Translator,
        defaults: &HashMap<String, String>,
    ) -> Result<Vec<FieldSpec>, SchemaCacheError> {
        let schema = self.schema_cache.get_schema(api_key, list_id, false).await?;
        Ok(build_form_spec(&schema, translator, defaults))
    }

    /// Validate, look the address up, and subscribe it if Mailchimp says it
    /// isn't a member yet. Invalid input never reaches Mailchimp.
    #[tracing::instrument(
        name = "Submitting subscription",
        skip(self, api_key, form, submitted),
        fields(subscriber_email = tracing::field::Empty)
    )]
    pub async fn submit(
        &self,
        api_key: &Secret<String>,
        list_id: &str,
        form: &[FieldSpec],
        submitted: &HashMap<String, String>,
    ) -> SubscriptionOutcome {
        let request = match validate_submission(form, submitted) {
            Ok(request) => request,
            Err(errors) => {
                tracing::info!(fields = ?errors.keys().collect::<Vec<_>>(), "invalid submission");
                return SubscriptionOutcome::ValidationFailed(errors);
            }
        };
        tracing::Span::current().record("subscriber_email", tracing::field::display(&request.email));

        let lookup = match self
            .provider
            .lookup_member(api_key, list_id, request.email.as_ref())
            .await
        {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, error.message = %e, "member lookup failed");
                return SubscriptionOutcome::ProviderUnavailable;
            }
        };

        let Some(code) = lookup.code else {
            tracing::warn!("member lookup had no status code");
            return SubscriptionOutcome::ProviderError("unknown".to_string());
        };

        let double_opt_in = match interpret(code) {
            LookupVerdict::AlreadySubscribed => {
                tracing::info!(code, "already subscribed");
                return SubscriptionOutcome::AlreadySubscribed;
            }
            LookupVerdict::Eligible { double_opt_in } => double_opt_in,
            LookupVerdict::Unexpected => {
                let message = lookup.message.unwrap_or_else(|| "unknown".to_string());
                tracing::warn!(code, %message, "unexpected member lookup code");
                return SubscriptionOutcome::ProviderError(message);
            }
        };

        match self
            .provider
            .subscribe(api_key, list_id, &request, double_opt_in)
            .await
        {
            Ok(SubscribeResponse::Accepted) => {
                tracing::info!(code, double_opt_in, "subscribed");
                SubscriptionOutcome::Subscribed { double_opt_in }
            }
            Ok(SubscribeResponse::Rejected(message)) => {
                tracing::warn!(code, %message, "subscription rejected");
                SubscriptionOutcome::ProviderError(message)
            }
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, error.message = %e, "subscribe failed");
                SubscriptionOutcome::ProviderUnavailable
            }
        }
    }
}
