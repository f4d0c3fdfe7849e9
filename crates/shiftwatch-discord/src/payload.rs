//! Webhook body: one embed card with a field per code.

use serde::Serialize;
use shiftwatch_core::notify::Notification;

#[derive(Debug, Serialize)]
pub(crate) struct WebhookMessage {
  pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Embed {
  pub title:       String,
  pub description: String,
  pub fields:      Vec<Field>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub footer:      Option<Footer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Field {
  pub name:   &'static str,
  pub value:  String,
  pub inline: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct Footer {
  pub text: String,
}

impl From<&Notification> for WebhookMessage {
  fn from(notification: &Notification) -> Self {
    let fields = notification
      .codes
      .iter()
      .map(|code| Field {
        name:   "Code",
        value:  code.to_string(),
        inline: false,
      })
      .collect();

    Self {
      embeds: vec![Embed {
        title: notification.title.clone(),
        description: notification.description.clone(),
        fields,
        footer: notification.footer().map(|text| Footer { text }),
      }],
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use serde_json::json;
  use shiftwatch_core::{Code, source::PostMeta};

  use super::*;

  #[test]
  fn notification_becomes_one_embed_with_code_fields() {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let codes = vec![
      Code::parse("AAAAA-AAAAA-AAAAA-AAAAA-AAAAA").unwrap(),
      Code::parse("BBBBB-BBBBB-BBBBB-BBBBB-BBBBB").unwrap(),
    ];
    let post = PostMeta {
      created_at: Some(now - Duration::minutes(7)),
      title:      Some("Two keys".into()),
    };
    let notification = &Notification::chunked(&codes, Some(&post), now)[0];

    let body = serde_json::to_value(WebhookMessage::from(notification)).unwrap();
    assert_eq!(
      body,
      json!({
        "embeds": [{
          "title": "New Shift Codes",
          "description": notification.description,
          "fields": [
            {"name": "Code", "value": "AAAAA-AAAAA-AAAAA-AAAAA-AAAAA", "inline": false},
            {"name": "Code", "value": "BBBBB-BBBBB-BBBBB-BBBBB-BBBBB", "inline": false}
          ],
          "footer": {"text": "Two keys · posted 7 minutes ago"}
        }]
      })
    );
  }

  #[test]
  fn footer_is_omitted_without_post_meta() {
    let now = Utc.timestamp_opt(0, 0).unwrap();
    let codes = vec![Code::parse("AAAAA-AAAAA-AAAAA-AAAAA-AAAAA").unwrap()];
    let notification = &Notification::chunked(&codes, None, now)[0];

    let body = serde_json::to_value(WebhookMessage::from(notification)).unwrap();
    assert!(body["embeds"][0].get("footer").is_none());
  }
}
