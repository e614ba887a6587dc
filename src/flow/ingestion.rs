//! Store-connection screen controller.

use std::sync::Arc;

use super::messages;
use crate::gateway::{BackendGateway, IngestRequest, IngestResponse};
use crate::onboarding::{OnboardingStep, OnboardingStore};

/// Whether `url` plausibly points at a Shopify store.
pub fn looks_like_shopify_url(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains(".myshopify.com") || url.contains("shopify")
}

pub struct IngestionScreen {
    store: Arc<OnboardingStore>,
    gateway: Arc<dyn BackendGateway>,
    busy: bool,
    error: Option<String>,
    last_result: Option<IngestResponse>,
}

impl IngestionScreen {
    pub fn new(store: Arc<OnboardingStore>, gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            store,
            gateway,
            busy: false,
            error: None,
            last_result: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The most recent successful ingestion, if any.
    pub fn last_result(&self) -> Option<&IngestResponse> {
        self.last_result.as_ref()
    }

    pub fn can_submit(&self, url: &str) -> bool {
        !self.busy && looks_like_shopify_url(url)
    }

    /// Start ingesting `url` for the session's business.
    pub async fn submit(&mut self, url: &str) -> Option<OnboardingStep> {
        if self.busy {
            return None;
        }
        self.error = None;
        self.busy = true;

        let request = IngestRequest {
            url: url.trim().to_string(),
            business_id: self.store.business_id().await,
        };
        let result = self.gateway.ingest(request).await;
        self.busy = false;

        match result {
            Ok(response) => {
                tracing::info!(
                    upload_batch_id = %response.upload_batch_id,
                    products = response.products,
                    status = %response.status,
                    "Store ingested"
                );
                self.store
                    .set_upload_batch_id(response.upload_batch_id.clone())
                    .await;
                self.last_result = Some(response);
                Some(self.store.current_step().await)
            }
            Err(e) => {
                tracing::warn!("Ingestion failed: {}", e);
                self.error = Some(messages::INGEST_FAILED.to_string());
                None
            }
        }
    }
}
