//! Fire-and-forget push notification dispatch.
//!
//! # Responsibility
//! - POST state-transition events to the external push endpoint.
//! - Keep delivery strictly best-effort: failures are logged, never
//!   surfaced to callers, never retried.
//!
//! # Invariants
//! - The acting device's own token is carried as `excludeToken` so the
//!   actor is not notified about their own action.

use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Serialize;
use std::time::Duration;

const SEND_PATH: &str = "/.netlify/functions/send-notification";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire action discriminator understood by the push endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyAction {
    Done,
    Missed,
    Custom,
}

/// Optional title/body override for `NotifyAction::Custom` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// JSON body POSTed to the push endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub action: NotifyAction,
    pub person: String,
    pub exclude_token: String,
    pub timestamp: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationContent>,
}

/// Client for the external push endpoint.
pub struct NotificationDispatcher {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl NotificationDispatcher {
    /// Builds a dispatcher for the given server base URL.
    ///
    /// Returns `None` when the HTTP client cannot be constructed; callers
    /// treat a missing dispatcher as notifications disabled.
    pub fn new(server_base_url: &str) -> Option<Self> {
        let client = match reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(err) => {
                warn!("event=notify_init module=notify status=error error={err}");
                return None;
            }
        };

        Some(Self {
            endpoint: format!("{}{SEND_PATH}", server_base_url.trim_end_matches('/')),
            client,
        })
    }

    /// Sends the payload on a detached thread; never blocks the caller on
    /// delivery and never reports the outcome beyond the log.
    pub fn dispatch(&self, payload: NotificationPayload) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        std::thread::spawn(move || {
            let action = payload.action;
            match client.post(&endpoint).json(&payload).send() {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "event=notify_send module=notify status=ok action={action:?} person={}",
                        payload.person
                    );
                }
                Ok(response) => {
                    warn!(
                        "event=notify_send module=notify status=error action={action:?} http_status={}",
                        response.status()
                    );
                }
                Err(err) => {
                    warn!(
                        "event=notify_send module=notify status=error action={action:?} error={err}"
                    );
                }
            }
        });
    }
}
