use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Phone,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: Channel,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<()>;
}

/// Notifier that writes messages to the log instead of a mail/SMS provider.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<()> {
        tracing::info!(
            channel = message.channel.as_str(),
            to = %message.to,
            subject = %message.subject,
            "outbound message"
        );
        Ok(())
    }
}

pub fn reset_link_message(channel: Channel, to: &str, name: &str, link: &str) -> OutboundMessage {
    let body = match channel {
        Channel::Email => format!(
            "<p>Hello {name},</p>\
             <p>Use the link below to reset your password. It stays valid for 7 days.</p>\
             <p><a href=\"{link}\">Reset password</a></p>"
        ),
        Channel::Phone => format!("Reset your password: {link}"),
    };
    OutboundMessage {
        channel,
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        body,
    }
}
