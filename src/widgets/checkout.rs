use crate::api::{AccessorError, ApiResult, RemoteAccessor, Transport};
use crate::lifecycle;
use crate::models::{SubscriptionPlan, SubscriptionReceipt, SubscriptionRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutForm {
    pub email: String,
    pub name: String,
    pub plan: SubscriptionPlan,
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl CheckoutForm {
    /// Checks run before any remote call
    pub fn validate(&self) -> ApiResult<SubscriptionRequest> {
        let name = self.name.trim();
        let email = self.email.trim();
        if name.is_empty() {
            return Err(AccessorError::Validation("Please enter your name".to_string()));
        }
        if !is_plausible_email(email) {
            return Err(AccessorError::Validation(
                "Please enter a valid email address".to_string(),
            ));
        }
        Ok(SubscriptionRequest {
            email: email.to_lowercase(),
            name: name.to_string(),
            subscription_type: self.plan.as_str().to_string(),
            duration_days: self.plan.duration_days(),
            amount: self.plan.amount(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckoutState {
    Editing { error: Option<String> },
    Submitting,
    Completed { receipt: SubscriptionReceipt },
}

pub struct CheckoutWidget<T> {
    api: Arc<RemoteAccessor<T>>,
    publishable_key: Option<String>,
    state: CheckoutState,
}

impl<T: Transport> CheckoutWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self {
            api,
            publishable_key: None,
            state: CheckoutState::Editing { error: None },
        }
    }

    pub fn with_publishable_key(mut self, key: Option<String>) -> Self {
        self.publishable_key = key;
        self
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub async fn submit(&mut self, form: &CheckoutForm) -> ApiResult<SubscriptionReceipt> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.state = CheckoutState::Editing {
                    error: Some(e.user_message()),
                };
                return Err(e);
            }
        };

        let sdk = lifecycle::payment_sdk(self.publishable_key.as_deref());
        if sdk.publishable_key.is_none() {
            warn!("PAYMENT_PUBLISHABLE_KEY not set, relying on hosted checkout");
        }

        self.state = CheckoutState::Submitting;
        match self.api.create_subscription(&request).await {
            Ok(envelope) => {
                info!(plan = %request.subscription_type, "subscription created");
                self.state = CheckoutState::Completed {
                    receipt: envelope.data.clone(),
                };
                Ok(envelope.data)
            }
            Err(e) => {
                warn!("subscription failed: {}", e);
                self.state = CheckoutState::Editing {
                    error: Some(e.user_message()),
                };
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeReply, FakeTransport};
    use crate::api::Operation;
    use serde_json::json;

    fn form(email: &str, name: &str) -> CheckoutForm {
        CheckoutForm {
            email: email.to_string(),
            name: name.to_string(),
            plan: SubscriptionPlan::Quarterly,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_plausible_email("fan@example.com"));
        assert!(is_plausible_email("a.b@mail.co.uk"));
        assert!(!is_plausible_email("fan@example"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("fan example@x.com"));
        assert!(!is_plausible_email("fan@@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_backend() {
        let fake = FakeTransport::new();
        let mut checkout = CheckoutWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        assert!(checkout.submit(&form("fan@example.com", "  ")).await.is_err());
        assert_eq!(
            checkout.state(),
            &CheckoutState::Editing {
                error: Some("Please enter your name".to_string())
            }
        );
        assert!(checkout.submit(&form("not-an-email", "Sam")).await.is_err());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_sends_plan_terms() {
        let fake = FakeTransport::new();
        fake.push(
            Operation::CreateSubscription,
            FakeReply::Data(json!({"id": "sub_123", "url": "https://pay.example/s/123"})),
        );
        let mut checkout = CheckoutWidget::new(Arc::new(RemoteAccessor::new(fake.clone())))
            .with_publishable_key(Some("pk_test_checkout".to_string()));

        let receipt = checkout
            .submit(&form(" Fan@Example.com ", "Sam Doe"))
            .await
            .unwrap();
        assert_eq!(receipt.subscription_id, "sub_123");
        assert_eq!(receipt.checkout_url.as_deref(), Some("https://pay.example/s/123"));
        assert!(matches!(checkout.state(), CheckoutState::Completed { .. }));
        assert!(lifecycle::PAYMENT_SDK.is_initialized());

        assert_eq!(
            fake.calls()[0].1,
            json!({
                "email": "fan@example.com",
                "name": "Sam Doe",
                "subscription_type": "quarterly",
                "duration_days": 90,
                "amount": 49.99
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_shown_verbatim() {
        let fake = FakeTransport::new();
        fake.push(
            Operation::CreateSubscription,
            FakeReply::ServerError("Email already has an active subscription".into()),
        );
        let mut checkout = CheckoutWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));
        assert!(checkout.submit(&form("fan@example.com", "Sam")).await.is_err());
        assert_eq!(
            checkout.state(),
            &CheckoutState::Editing {
                error: Some("Email already has an active subscription".to_string())
            }
        );
    }
}
