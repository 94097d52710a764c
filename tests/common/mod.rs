#![allow(dead_code)]

use async_trait::async_trait;
use ipcheck_bot::delivery::{DeliveryChannel, MessageId};
use ipcheck_bot::DeliveryError;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const INFO_PATH: &str = "/api";
pub const PROXY_PATH: &str = "/check";

/// JSON body the IP information service returns for `ip`
pub fn info_body(ip: &str) -> serde_json::Value {
    serde_json::json!({
        "ip": ip,
        "originIp": ip,
        "isp": "Example ISP",
        "country": "Australia",
        "countryCode": "AU",
        "city": "Sydney"
    })
}

/// Mounts a successful IP information response for `ip`
pub async fn mount_info(server: &MockServer, ip: &str) {
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .and(query_param("ip", ip))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body(ip)))
        .mount(server)
        .await;
}

/// Mounts a failing IP information response for `ip`
pub async fn mount_info_failure(server: &MockServer, ip: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .and(query_param("ip", ip))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a slow IP information response for every address
pub async fn mount_info_delayed(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(INFO_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(info_body("0.0.0.0"))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mounts a proxy check response for `ip`
pub async fn mount_proxy(server: &MockServer, ip: &str, active: bool) {
    Mock::given(method("GET"))
        .and(path(PROXY_PATH))
        .and(query_param("ip", ip))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ip": ip,
            "proxyip": active
        })))
        .mount(server)
        .await;
}

/// One call observed by [`RecordingChannel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Send(MessageId, String),
    Placeholder(MessageId),
    Replace(MessageId, String),
}

/// In-memory channel recording every call in order
#[derive(Debug, Default)]
pub struct RecordingChannel {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI64,
    pub fail_placeholder: bool,
    pub fail_replace: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_replace() -> Self {
        Self {
            fail_replace: true,
            ..Default::default()
        }
    }

    pub fn failing_placeholder() -> Self {
        Self {
            fail_placeholder: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Report texts that reached the channel, in order
    pub fn reports(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Replace(_, text) | Event::Send(_, text) => Some(text),
                Event::Placeholder(_) => None,
            })
            .collect()
    }

    fn next_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn send(&self, text: &str) -> Result<MessageId, DeliveryError> {
        let id = self.next_id();
        self.events
            .lock()
            .unwrap()
            .push(Event::Send(id, text.to_string()));
        Ok(id)
    }

    async fn replace(&self, message: MessageId, text: &str) -> Result<(), DeliveryError> {
        if self.fail_replace {
            return Err(DeliveryError::Api("message to edit not found".to_string()));
        }
        self.events
            .lock()
            .unwrap()
            .push(Event::Replace(message, text.to_string()));
        Ok(())
    }

    async fn post_placeholder(&self) -> Result<MessageId, DeliveryError> {
        if self.fail_placeholder {
            return Err(DeliveryError::Api("chat not found".to_string()));
        }
        let id = self.next_id();
        self.events.lock().unwrap().push(Event::Placeholder(id));
        Ok(id)
    }
}
