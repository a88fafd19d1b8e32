// Mail service
// Gmail searches with per-message metadata fan-out and the mail widget
// summary.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use futures::future::join_all;

use super::{cached, degrade};
use crate::api::gmail::{MailSource, MessageQuery, RawMessage};
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::normalize::mail::normalize_message;
use crate::normalize::{local_date, local_midnight};
use crate::rollup;
use crate::types::{Credentials, MailMessage, MailSummary};

const TOP_SENDERS: usize = 3;

/// Gmail search strings issued by the summary.
pub struct SummaryQueries {
    pub unread: String,
    pub today: String,
    pub yesterday: String,
    pub important: String,
}

impl SummaryQueries {
    /// "Today" runs from local midnight; "yesterday" is the whole previous
    /// local day. Bounds are epoch seconds, filtered by the provider.
    pub fn at(now: DateTime<Utc>, tz: &Tz) -> Self {
        let today = local_date(now, tz);
        let today_start = local_midnight(today, tz).timestamp();
        let yesterday_start = local_midnight(today - Duration::days(1), tz).timestamp();
        Self {
            unread: "is:unread".to_string(),
            today: format!("after:{}", today_start),
            yesterday: format!("after:{} before:{}", yesterday_start, today_start),
            important: "is:important is:unread".to_string(),
        }
    }
}

/// Fetched metadata for one search plus its full match count.
#[derive(Debug, Clone)]
struct MailBatch {
    messages: Vec<RawMessage>,
    total: usize,
}

/// Normalized messages of one search, newest first.
struct SearchWindow {
    messages: Vec<MailMessage>,
    total: usize,
}

pub struct MailService {
    source: Arc<dyn MailSource>,
    /// Raw metadata per search; labels are rendered against the clock on read
    cache: TtlCache<MailBatch>,
    clock: Arc<dyn Clock>,
    tz: Tz,
    preview_limit: usize,
    max_results: u32,
}

impl MailService {
    pub fn new(
        source: Arc<dyn MailSource>,
        clock: Arc<dyn Clock>,
        tz: Tz,
        ttl_secs: u64,
        preview_limit: usize,
        max_results: u32,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl_secs, clock.clone()),
            clock,
            tz,
            preview_limit,
            max_results,
        }
    }

    /// Messages matching a Gmail search, newest first.
    pub async fn search(
        &self,
        credentials: &Credentials,
        q: &str,
        limit: u32,
    ) -> Result<Vec<MailMessage>, ServiceError> {
        let window = self.search_at(credentials, q, limit, self.clock.now()).await?;
        Ok(window.messages)
    }

    async fn search_at(
        &self,
        credentials: &Credentials,
        q: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<SearchWindow, ServiceError> {
        let query = MessageQuery::new(q, limit);
        let token = credentials.access_token.as_str();
        let batch = cached(&self.cache, query.cache_key(token), || {
            self.fetch_messages(token, &query)
        })
        .await?;

        let mut messages: Vec<MailMessage> = batch
            .messages
            .iter()
            .filter_map(|m| match normalize_message(m, now, &self.tz) {
                Ok(msg) => Some(msg),
                Err(err) => {
                    log::debug!("{}", err);
                    None
                }
            })
            .collect();
        messages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(SearchWindow {
            total: batch.total.max(messages.len()),
            messages,
        })
    }

    /// List ids, then fetch every message's metadata concurrently.
    ///
    /// A rejected credential aborts the whole search; any other per-message
    /// failure only drops that message. The total is the provider's count of
    /// all matches, not just the fetched page.
    async fn fetch_messages(
        &self,
        token: &str,
        query: &MessageQuery,
    ) -> Result<MailBatch, ServiceError> {
        let list = self.source.list_messages(token, query).await?;
        let refs = list.refs;
        let details = join_all(refs.iter().map(|r| self.source.get_message(token, &r.id))).await;

        let mut messages = Vec::with_capacity(details.len());
        for (r, detail) in refs.iter().zip(details) {
            match detail {
                Ok(msg) => messages.push(msg),
                Err(err @ (ServiceError::Unauthorized | ServiceError::Forbidden)) => return Err(err),
                Err(err) => log::debug!("Skipped message {}: {}", r.id, err),
            }
        }
        Ok(MailBatch {
            messages,
            total: list.total,
        })
    }

    /// Mail widget summary. Never fails; see `MailSummary::degraded`.
    pub async fn get_summary(&self, credentials: &Credentials) -> MailSummary {
        let now = self.clock.now();
        match self.build_summary(credentials, now).await {
            Ok(summary) => summary,
            Err(err) => MailSummary::empty(now, Some(degrade("mail", &err, now))),
        }
    }

    async fn build_summary(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<MailSummary, ServiceError> {
        let queries = SummaryQueries::at(now, &self.tz);
        let limit = self.max_results;
        let (unread, today, yesterday, important) = tokio::try_join!(
            self.search_at(credentials, &queries.unread, limit, now),
            self.search_at(credentials, &queries.today, limit, now),
            self.search_at(credentials, &queries.yesterday, limit, now),
            self.search_at(credentials, &queries.important, limit, now),
        )?;

        Ok(MailSummary {
            total_unread: unread.total,
            total_today: today.total,
            total_important: important.total,
            yesterday_count: yesterday.total,
            trend: rollup::trend(today.total, yesterday.total),
            top_senders: rollup::top_senders(&today.messages, TOP_SENDERS),
            unread: rollup::preview_of(&unread.messages, unread.total, self.preview_limit),
            today: rollup::preview_of(&today.messages, today.total, self.preview_limit),
            important: rollup::preview_of(&important.messages, important.total, self.preview_limit),
            generated_at: now,
            degraded: None,
        })
    }

    pub async fn validate_token(&self, credentials: &Credentials) -> bool {
        match self.source.validate_token(&credentials.access_token).await {
            Ok(()) => true,
            Err(err) => {
                log::info!("mail token rejected: {}", err);
                false
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorType;
    use crate::services::fakes::{mail, FakeMail, GOOD_TOKEN};
    use crate::types::Trend;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn tz() -> Tz {
        "Europe/Bucharest".parse().unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new(GOOD_TOKEN)
    }

    fn now() -> DateTime<Utc> {
        // 14:00 local
        at("2026-02-09T12:00:00Z")
    }

    /// Five messages today, three yesterday, one older.
    fn inbox() -> Vec<RawMessage> {
        vec![
            mail("t1", "Sarah Chen <sarah@acme.com>", at("2026-02-09T07:00:00Z"), &["INBOX", "UNREAD", "IMPORTANT"]),
            mail("t2", "Sarah Chen <sarah@acme.com>", at("2026-02-09T08:00:00Z"), &["INBOX", "UNREAD"]),
            mail("t3", "Bob <bob@acme.com>", at("2026-02-09T09:00:00Z"), &["INBOX"]),
            mail("t4", "Sarah Chen <sarah@acme.com>", at("2026-02-09T10:00:00Z"), &["INBOX", "UNREAD", "IMPORTANT"]),
            mail("t5", "ann@acme.com", at("2026-02-09T11:00:00Z"), &["INBOX", "UNREAD"]),
            // 23:30 local on the 8th still counts as yesterday
            mail("y0", "Bob <bob@acme.com>", at("2026-02-08T21:30:00Z"), &["INBOX"]),
            mail("y1", "Bob <bob@acme.com>", at("2026-02-08T09:00:00Z"), &["INBOX"]),
            mail("y2", "Bob <bob@acme.com>", at("2026-02-08T15:00:00Z"), &["INBOX", "UNREAD"]),
            mail("old", "Bob <bob@acme.com>", at("2026-01-20T09:00:00Z"), &["INBOX"]),
        ]
    }

    fn service(source: Arc<FakeMail>, clock: Arc<ManualClock>) -> MailService {
        MailService::new(source, clock, tz(), 120, 3, 25)
    }

    #[test]
    fn test_summary_queries_use_local_days() {
        let q = SummaryQueries::at(now(), &tz());
        // 2026-02-09T00:00+02:00 and 2026-02-08T00:00+02:00
        assert_eq!(q.today, "after:1770588000");
        assert_eq!(q.yesterday, "after:1770501600 before:1770588000");
        assert_eq!(q.unread, "is:unread");
        assert_eq!(q.important, "is:important is:unread");
    }

    #[tokio::test]
    async fn test_summary_counts_and_trend() {
        let clock = Arc::new(ManualClock::new(now()));
        let svc = service(Arc::new(FakeMail::new(inbox())), clock);

        let summary = svc.get_summary(&creds()).await;
        assert!(summary.degraded.is_none());
        assert_eq!(summary.total_today, 5);
        assert_eq!(summary.yesterday_count, 3);
        assert_eq!(summary.trend, Trend::Up);
        assert_eq!(summary.total_unread, 5);
        assert_eq!(summary.total_important, 2);

        assert_eq!(summary.today.items.len(), 3);
        assert!(summary.today.has_more);
        assert_eq!(summary.today.items[0].id, "t5");
        assert_eq!(summary.top_senders[0].email, "sarah@acme.com");
        assert_eq!(summary.top_senders[0].count, 3);
    }

    #[tokio::test]
    async fn test_counts_exceed_fetch_limit() {
        let clock = Arc::new(ManualClock::new(now()));
        let backlog: Vec<RawMessage> = (0..40)
            .map(|i| {
                mail(
                    &format!("u{:02}", i),
                    "Bob <bob@acme.com>",
                    at("2026-02-01T09:00:00Z") + Duration::minutes(i),
                    &["INBOX", "UNREAD"],
                )
            })
            .collect();
        let source = Arc::new(FakeMail::new(backlog));
        let svc = service(source.clone(), clock);

        let summary = svc.get_summary(&creds()).await;
        assert_eq!(summary.total_unread, 40);
        assert_eq!(summary.unread.total, 40);
        assert_eq!(summary.unread.items.len(), 3);
        assert!(summary.unread.has_more);
        assert_eq!(summary.unread.items[0].id, "u39");
        // Only the first page of details is fetched
        assert_eq!(source.detail_calls(), 25);
    }

    #[tokio::test]
    async fn test_yesterday_busier_trends_down() {
        let clock = Arc::new(ManualClock::new(now()));
        let quiet_today = vec![
            mail("t1", "Bob <bob@acme.com>", at("2026-02-09T07:00:00Z"), &["INBOX"]),
            mail("y1", "Bob <bob@acme.com>", at("2026-02-08T09:00:00Z"), &["INBOX"]),
            mail("y2", "Bob <bob@acme.com>", at("2026-02-08T15:00:00Z"), &["INBOX"]),
        ];
        let svc = service(Arc::new(FakeMail::new(quiet_today)), clock);

        let summary = svc.get_summary(&creds()).await;
        assert_eq!(summary.total_today, 1);
        assert_eq!(summary.yesterday_count, 2);
        assert_eq!(summary.trend, Trend::Down);
    }

    #[tokio::test]
    async fn test_search_is_cached_per_query() {
        let clock = Arc::new(ManualClock::new(now()));
        let source = Arc::new(FakeMail::new(inbox()));
        let svc = service(source.clone(), clock.clone());

        let first = svc.search(&creds(), "is:unread", 10).await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(source.list_calls(), 1);
        let details = source.detail_calls();

        svc.search(&creds(), "is:unread", 10).await.unwrap();
        assert_eq!(source.list_calls(), 1);
        assert_eq!(source.detail_calls(), details);

        // Different limit, different key
        svc.search(&creds(), "is:unread", 5).await.unwrap();
        assert_eq!(source.list_calls(), 2);

        clock.advance(Duration::seconds(121));
        svc.search(&creds(), "is:unread", 10).await.unwrap();
        assert_eq!(source.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_broken_message_is_skipped() {
        let clock = Arc::new(ManualClock::new(now()));
        let mut fake = FakeMail::new(inbox());
        fake.broken.insert("t3".to_string());
        let svc = service(Arc::new(fake), clock);

        let today = svc.search(&creds(), "after:1770588000", 25).await.unwrap();
        let ids: Vec<&str> = today.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["t5", "t4", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_unauthorized_detail_aborts_search() {
        let clock = Arc::new(ManualClock::new(now()));
        let mut fake = FakeMail::new(inbox());
        fake.detail_status = Some(401);
        let svc = service(Arc::new(fake), clock);

        let err = svc.search(&creds(), "is:unread", 10).await.unwrap_err();
        assert!(err.requires_reauth());
    }

    #[tokio::test]
    async fn test_list_failure_falls_back_to_empty_summary() {
        let clock = Arc::new(ManualClock::new(now()));
        let mut fake = FakeMail::new(inbox());
        fake.list_status = Some(403);
        let source = Arc::new(fake);
        let svc = service(source.clone(), clock);

        let summary = svc.get_summary(&creds()).await;
        assert_eq!(summary.total_unread, 0);
        assert_eq!(summary.trend, Trend::Stable);
        assert!(summary.top_senders.is_empty());
        assert_eq!(
            summary.degraded.map(|d| d.error_type),
            Some(ErrorType::RequiresUserAction)
        );
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_degrades_as_reauth() {
        let clock = Arc::new(ManualClock::new(now()));
        let svc = service(Arc::new(FakeMail::new(inbox())), clock);

        let summary = svc.get_summary(&Credentials::new("expired")).await;
        assert_eq!(
            summary.degraded.map(|d| d.error_type),
            Some(ErrorType::RequiresReauth)
        );
        assert!(!svc.validate_token(&Credentials::new("expired")).await);
        assert!(svc.validate_token(&creds()).await);
    }
}
