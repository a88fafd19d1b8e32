//! Gmail message metadata → `MailMessage`.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;

use super::{format_time_display, local_date, skipped};
use crate::api::gmail::{RawMessage, RawPart};
use crate::error::ServiceError;
use crate::types::{Avatar, MailCategory, MailMessage, Sender};
use crate::util::{decode_html_entities, initials, name_from_email};

const AVATAR_COLORS: &[&str] = &[
    "#f44336", "#e91e63", "#9c27b0", "#3f51b5", "#2196f3", "#009688", "#ff9800", "#795548",
];

/// Split a From/To header into (display name, address).
///
/// Accepts `"Name" <addr>`, `Name <addr>`, `<addr>` and a bare address.
pub fn parse_address(header: &str) -> (String, String) {
    let header = header.trim();
    if let (Some(open), Some(close)) = (header.rfind('<'), header.rfind('>')) {
        if open < close {
            let email = header[open + 1..close].trim().to_string();
            let name = header[..open].trim().trim_matches('"').trim().to_string();
            return (name, email);
        }
    }
    (String::new(), header.to_string())
}

/// Deterministic palette color for an address.
pub fn avatar_color(email: &str) -> String {
    let hash = email
        .to_lowercase()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    AVATAR_COLORS[(hash as usize) % AVATAR_COLORS.len()].to_string()
}

pub fn parse_sender(header: &str) -> Sender {
    let (name, email) = parse_address(header);
    let name = if !name.is_empty() {
        name
    } else {
        let derived = name_from_email(&email);
        if !derived.is_empty() {
            derived
        } else if !email.is_empty() {
            email.clone()
        } else {
            "Unknown sender".to_string()
        }
    };
    let avatar = Avatar {
        initials: initials(&name),
        color: avatar_color(&email),
    };
    Sender {
        name,
        email,
        avatar,
    }
}

/// Parse an RFC 2822 `Date` header, tolerating a trailing `(Zone)` comment.
pub fn parse_mail_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = match value.find(" (") {
        Some(idx) => &value[..idx],
        None => value,
    };
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_str(value, "%d %b %Y %H:%M:%S %z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_internal_date(value: Option<&str>) -> Option<DateTime<Utc>> {
    let millis = value?.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub fn mail_category(labels: &[String]) -> MailCategory {
    for label in labels {
        match label.as_str() {
            "CATEGORY_SOCIAL" => return MailCategory::Social,
            "CATEGORY_PROMOTIONS" => return MailCategory::Promotions,
            "CATEGORY_UPDATES" => return MailCategory::Updates,
            "CATEGORY_FORUMS" => return MailCategory::Forums,
            _ => {}
        }
    }
    MailCategory::Primary
}

fn has_attachment(parts: &[RawPart]) -> bool {
    parts.iter().any(|p| {
        p.filename.as_deref().is_some_and(|f| !f.is_empty()) || has_attachment(&p.parts)
    })
}

/// "9:05 AM" for today, "Feb 3" earlier this year, "Dec 28, 2025" otherwise.
pub fn mail_time_label(date: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String {
    let local = date.with_timezone(tz);
    let today = local_date(now, tz);
    if local.date_naive() == today {
        format_time_display(date, tz)
    } else if local.year() == today.year() {
        local.format("%b %-d").to_string()
    } else {
        local.format("%b %-d, %Y").to_string()
    }
}

/// Normalize one message. The `Date` header wins; the provider's internal
/// timestamp is the fallback.
pub fn normalize_message(
    raw: &RawMessage,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<MailMessage, ServiceError> {
    if raw.id.is_empty() {
        return Err(skipped(&raw.id, "missing id"));
    }

    let date = raw
        .header("Date")
        .and_then(parse_mail_date)
        .or_else(|| parse_internal_date(raw.internal_date.as_deref()))
        .ok_or_else(|| skipped(&raw.id, "no usable date"))?;

    let subject = raw
        .header("Subject")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(no subject)")
        .to_string();

    let labels = raw.label_ids.clone();
    let has_label = |name: &str| labels.iter().any(|l| l == name);
    let parts = raw.payload.as_ref().map(|p| &p.parts[..]).unwrap_or(&[]);

    Ok(MailMessage {
        id: raw.id.clone(),
        thread_id: raw.thread_id.clone(),
        subject,
        from: parse_sender(raw.header("From").unwrap_or("")),
        to: raw.header("To").unwrap_or("").trim().to_string(),
        date,
        time_label: mail_time_label(date, now, tz),
        snippet: decode_html_entities(raw.snippet.as_deref().unwrap_or("")),
        is_unread: has_label("UNREAD"),
        is_important: has_label("IMPORTANT"),
        is_starred: has_label("STARRED"),
        category: mail_category(&labels),
        size_estimate: raw.size_estimate.unwrap_or(0),
        has_attachments: has_attachment(parts),
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tz() -> Tz {
        "Europe/Bucharest".parse().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn raw(json: serde_json::Value) -> RawMessage {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(
            parse_address("\"Chen, Sarah\" <sarah@acme.com>"),
            ("Chen, Sarah".to_string(), "sarah@acme.com".to_string())
        );
        assert_eq!(
            parse_address("Bob <bob@acme.com>"),
            ("Bob".to_string(), "bob@acme.com".to_string())
        );
        assert_eq!(
            parse_address("<noreply@acme.com>"),
            (String::new(), "noreply@acme.com".to_string())
        );
        assert_eq!(
            parse_address("plain@acme.com"),
            (String::new(), "plain@acme.com".to_string())
        );
    }

    #[test]
    fn test_sender_avatar() {
        let sender = parse_sender("Sarah Chen <sarah@acme.com>");
        assert_eq!(sender.avatar.initials, "SC");
        assert_eq!(sender.avatar.color, avatar_color("SARAH@acme.com"));

        let derived = parse_sender("ops.team@acme.com");
        assert_eq!(derived.name, "Ops Team");
        assert_eq!(derived.avatar.initials, "OT");

        let empty = parse_sender("");
        assert_eq!(empty.name, "Unknown sender");
    }

    #[test]
    fn test_parse_mail_date_variants() {
        let expected = at("2026-02-08T09:00:00Z");
        assert_eq!(
            parse_mail_date("Sun, 8 Feb 2026 11:00:00 +0200"),
            Some(expected)
        );
        assert_eq!(
            parse_mail_date("Sun, 8 Feb 2026 09:00:00 +0000 (UTC)"),
            Some(expected)
        );
        assert_eq!(parse_mail_date("8 Feb 2026 09:00:00 +0000"), Some(expected));
        assert!(parse_mail_date("yesterday-ish").is_none());
    }

    #[test]
    fn test_normalize_full_message() {
        let msg = raw(serde_json::json!({
            "id": "m1",
            "threadId": "t1",
            "labelIds": ["INBOX", "UNREAD", "IMPORTANT", "CATEGORY_UPDATES"],
            "snippet": "Don&#39;t forget &amp; bring slides",
            "internalDate": "1770541200000",
            "sizeEstimate": 4821,
            "payload": {
                "headers": [
                    {"name": "From", "value": "Sarah Chen <sarah@acme.com>"},
                    {"name": "To", "value": "me@acme.com"},
                    {"name": "Subject", "value": "  Quarterly review  "},
                    {"name": "Date", "value": "Sun, 8 Feb 2026 09:00:00 +0000"}
                ],
                "parts": [
                    {"mimeType": "multipart/alternative", "parts": [{"mimeType": "text/plain"}]},
                    {"mimeType": "application/pdf", "filename": "deck.pdf"}
                ]
            }
        }));

        let n = normalize_message(&msg, at("2026-02-08T12:00:00Z"), &tz()).unwrap();
        assert_eq!(n.subject, "Quarterly review");
        assert_eq!(n.from.email, "sarah@acme.com");
        assert_eq!(n.to, "me@acme.com");
        assert_eq!(n.date, at("2026-02-08T09:00:00Z"));
        assert_eq!(n.time_label, "11:00 AM");
        assert_eq!(n.snippet, "Don't forget & bring slides");
        assert!(n.is_unread && n.is_important && !n.is_starred);
        assert_eq!(n.category, MailCategory::Updates);
        assert_eq!(n.size_estimate, 4821);
        assert!(n.has_attachments);
    }

    #[test]
    fn test_internal_date_fallback_and_defaults() {
        let msg = raw(serde_json::json!({
            "id": "m2",
            "internalDate": "1770541200000"
        }));
        let n = normalize_message(&msg, at("2026-03-01T00:00:00Z"), &tz()).unwrap();
        assert_eq!(n.date, Utc.timestamp_millis_opt(1770541200000).unwrap());
        assert_eq!(n.subject, "(no subject)");
        assert_eq!(n.snippet, "");
        assert!(!n.has_attachments);
        assert_eq!(n.category, MailCategory::Primary);
        assert_eq!(n.time_label, "Feb 8");
    }

    #[test]
    fn test_message_without_any_date_is_skipped() {
        let msg = raw(serde_json::json!({"id": "m3"}));
        assert!(matches!(
            normalize_message(&msg, Utc::now(), &tz()),
            Err(ServiceError::NormalizationSkipped { .. })
        ));
    }

    #[test]
    fn test_time_label_older_year() {
        let label = mail_time_label(
            at("2025-12-28T10:00:00Z"),
            at("2026-02-08T10:00:00Z"),
            &tz(),
        );
        assert_eq!(label, "Dec 28, 2025");
    }
}
