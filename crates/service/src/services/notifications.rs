//! Back-in-stock notification delivery.
//!
//! The notifier only needs "send one notification"; [`HttpNotificationClient`]
//! posts to the notification service, [`LogNotificationSender`] stands in
//! when no service URL is configured.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use niaga_customer_core::{CustomerId, ProductId, SubscriptionId, VariantId};

/// Path of the back-in-stock endpoint on the notification service.
const BACK_IN_STOCK_PATH: &str = "api/v1/notifications/back-in-stock";

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The notification service rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Payload of one back-in-stock notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackInStockNotification {
    pub subscription_id: SubscriptionId,
    pub customer_id: CustomerId,
    pub customer_email: String,
    pub customer_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    pub variant_id: Option<VariantId>,
    pub variant_sku: Option<String>,
    pub variant_name: Option<String>,
    pub stock_quantity: i64,
}

/// Delivers one notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_back_in_stock(
        &self,
        notification: &BackInStockNotification,
    ) -> Result<(), NotificationError>;
}

/// HTTP client for the notification service.
#[derive(Clone)]
pub struct HttpNotificationClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpNotificationClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: &Url) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        // Joining a relative path onto a base ending in '/' cannot fail.
        let endpoint = base.join(BACK_IN_STOCK_PATH).unwrap_or(base);

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl NotificationSender for HttpNotificationClient {
    async fn send_back_in_stock(
        &self,
        notification: &BackInStockNotification,
    ) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(notification)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Logs notifications instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send_back_in_stock(
        &self,
        notification: &BackInStockNotification,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            subscription_id = %notification.subscription_id,
            customer_id = %notification.customer_id,
            product_id = %notification.product_id,
            stock_quantity = notification.stock_quantity,
            "Back-in-stock notification (no notification service configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_path() {
        let client =
            HttpNotificationClient::new(&Url::parse("http://notify.internal:8006").unwrap())
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://notify.internal:8006/api/v1/notifications/back-in-stock"
        );

        let client =
            HttpNotificationClient::new(&Url::parse("http://gateway/notification").unwrap())
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://gateway/notification/api/v1/notifications/back-in-stock"
        );
    }

    #[test]
    fn test_payload_is_camel_case() {
        let notification = BackInStockNotification {
            subscription_id: SubscriptionId::generate(),
            customer_id: CustomerId::generate(),
            customer_email: "farah@example.com".to_owned(),
            customer_name: "Farah".to_owned(),
            product_id: ProductId::generate(),
            product_name: "Tudung Bawal".to_owned(),
            product_slug: "tudung-bawal".to_owned(),
            product_image: None,
            variant_id: None,
            variant_sku: None,
            variant_name: None,
            stock_quantity: 12,
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["customerEmail"], "farah@example.com");
        assert_eq!(json["stockQuantity"], 12);
        assert!(json["variantId"].is_null());
    }
}
