use serde::Serialize;
use serde_json::Value;

use super::Notify;
use crate::envelope::ServiceData;
use crate::types::{Error, Result};

/// A notification for one notifier service (e.g. `mobile_app_pixel`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotifyRequest {
    /// Notifier to call; becomes the envelope's `service`.
    #[serde(skip)]
    pub service_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Platform-specific extras (actions, image, priority, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl NotifyRequest {
    pub fn new(service_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl Notify {
    /// Send a notification. Notifications carry no target entity.
    pub async fn notify(&self, request: NotifyRequest) -> Result<()> {
        if request.service_name.is_empty() {
            return Err(Error::validation("notify requires a service name"));
        }
        let data = ServiceData::from_serialize(&request)?;
        self.send("", &request.service_name, Some(data)).await
    }
}
