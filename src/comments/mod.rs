//! Comments 모듈 - 커서 페이지네이션 기반 댓글 전체 수집
//!
//! - Source: 한 페이지 요청 + 디코드 (`CommentSource`)
//! - Session: 누적/중복 제거/커서 상태 (`FetchSession`)
//! - Paginator: 순차 루프 + 페이지 간 대기 + 취소 (`CommentPaginator`)
//! - Export: CSV 내보내기

mod export;
mod session;
mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::HarvestConfig;
use crate::http::FetchError;
use crate::normalize::{to_count, to_id, to_text};

pub use export::{default_export_path, export_csv, write_csv, CSV_HEADERS};
pub use session::FetchSession;
pub use source::{
    decode_page, CommentPage, CommentSource, HttpCommentSource, APP_ID, APP_LANGUAGE, PAGE_SIZE,
};

// ============================================================================
// Types
// ============================================================================

/// 댓글 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// 댓글 ID (cid)
    pub id: String,
    /// 작성자 닉네임
    pub author: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub like_count: u64,
    pub reply_count: u64,
}

impl Comment {
    /// 업스트림 댓글 JSON에서 생성 (cid 없으면 None)
    pub fn from_value(raw: &Value) -> Option<Self> {
        let id = to_id(raw.get("cid"))?;

        let created_at = i64::try_from(to_count(raw.get("create_time")))
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();

        Some(Self {
            id,
            author: to_text(raw.pointer("/user/nickname")).unwrap_or_default(),
            avatar_url: to_text(raw.pointer("/user/avatar_thumb/url_list/0")),
            created_at,
            text: raw
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            like_count: to_count(raw.get("digg_count")),
            reply_count: to_count(raw.get("reply_comment_total")),
        })
    }
}

/// 수집 종료 상태
#[derive(Debug)]
pub enum FetchOutcome {
    /// 업스트림이 더 없다고 알림
    Completed,
    /// 중간 실패 (그때까지 모은 것은 결과에 포함)
    PartialFailure { reason: FetchError, count: usize },
    /// 호출자가 취소
    Cancelled,
}

impl FetchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, FetchOutcome::Completed)
    }
}

/// `fetch_all` 결과: 누적 댓글(도착 순서) + 종료 상태
#[derive(Debug)]
pub struct CommentFetchResult {
    pub comments: Vec<Comment>,
    pub outcome: FetchOutcome,
}

// ============================================================================
// CommentPaginator
// ============================================================================

/// 댓글 전체 수집기
///
/// 한 번에 요청 하나만 보내고, 페이지 사이에 고정 대기 시간을 둡니다.
/// 페이지 수 상한은 없습니다. 시간/횟수 제한이 필요하면 취소 플래그를 쓰세요.
pub struct CommentPaginator<S: CommentSource> {
    source: S,
    page_delay: Duration,
}

impl CommentPaginator<HttpCommentSource> {
    /// 설정에서 HTTP 소스 기반 수집기 생성
    pub fn from_config(config: &HarvestConfig) -> anyhow::Result<Self> {
        Ok(Self::new(HttpCommentSource::new(config)?, config.page_delay))
    }
}

impl<S: CommentSource> CommentPaginator<S> {
    pub fn new(source: S, page_delay: Duration) -> Self {
        Self { source, page_delay }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 영상의 댓글 전체 수집
    ///
    /// 페이지마다 `on_progress(누적 개수)`를 호출합니다.
    /// `cancel`이 켜지면 다음 요청 전에 멈추고 `Cancelled`를 반환합니다.
    /// 이미 보낸 요청은 끝날 때까지 기다립니다.
    pub async fn fetch_all<F>(
        &self,
        video_id: &str,
        cancel: &AtomicBool,
        mut on_progress: F,
    ) -> CommentFetchResult
    where
        F: FnMut(usize),
    {
        let mut session = FetchSession::new();
        tracing::info!("Fetching comments for {} via {}", video_id, self.source.name());

        while session.is_running() {
            if cancel.load(Ordering::SeqCst) {
                tracing::info!("Comment fetch cancelled after {} comments", session.count());
                session.cancel();
                continue;
            }

            match self.source.fetch_page(video_id, session.cursor()).await {
                Ok(page) => {
                    let next = page.next_cursor();
                    let added = session.absorb(page.comments);
                    tracing::debug!(
                        "Page at cursor {}: {} new, {} total",
                        session.cursor(),
                        added,
                        session.count()
                    );
                    on_progress(session.count());

                    match next {
                        Some(cursor) => {
                            session.advance(cursor);
                            tokio::time::sleep(self.page_delay).await;
                        }
                        None => session.complete(),
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Comment fetch stopped at cursor {} with {} comments: {}",
                        session.cursor(),
                        session.count(),
                        e
                    );
                    session.fail(e);
                }
            }
        }

        let result = session.into_result();
        tracing::info!(
            "Comment fetch finished: {} comments ({:?})",
            result.comments.len(),
            result.outcome
        );
        result
    }
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::test_support::{page, ScriptedSource};
    use super::*;

    fn paginator(pages: Vec<Result<CommentPage, FetchError>>) -> CommentPaginator<ScriptedSource> {
        CommentPaginator::new(ScriptedSource::new(pages), Duration::ZERO)
    }

    fn ids(result: &CommentFetchResult) -> Vec<&str> {
        result.comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_comment_from_value() {
        let raw = serde_json::json!({
            "cid": "7300",
            "text": "nice \"video\"",
            "create_time": 1700000000,
            "digg_count": "12",
            "reply_comment_total": 3,
            "user": {"nickname": "carol", "avatar_thumb": {"url_list": ["https://cdn/a.webp", "https://cdn/b.webp"]}}
        });
        let comment = Comment::from_value(&raw).expect("comment");
        assert_eq!(comment.id, "7300");
        assert_eq!(comment.author, "carol");
        assert_eq!(comment.avatar_url.as_deref(), Some("https://cdn/a.webp"));
        assert_eq!(comment.created_at.timestamp(), 1_700_000_000);
        assert_eq!(comment.like_count, 12);
        assert_eq!(comment.reply_count, 3);
    }

    #[test]
    fn test_comment_without_cid_rejected() {
        assert!(Comment::from_value(&serde_json::json!({"text": "x"})).is_none());
    }

    #[tokio::test]
    async fn test_overlapping_pages_counted_once() {
        let paginator = paginator(vec![
            page(&["a", "b", "c"], true, Some(3)),
            page(&["a", "b", "c"], false, None),
        ]);
        let cancel = AtomicBool::new(false);
        let mut progress = Vec::new();

        let result = paginator.fetch_all("v", &cancel, |n| progress.push(n)).await;

        assert!(result.outcome.is_completed());
        assert_eq!(ids(&result), vec!["a", "b", "c"]);
        assert_eq!(progress.last(), Some(&3));
        assert!(progress.iter().all(|n| *n <= 3));
    }

    #[tokio::test]
    async fn test_empty_page_with_has_more_continues() {
        let paginator = paginator(vec![
            page(&["a"], true, Some(1)),
            page(&[], true, Some(2)),
            page(&["b", "c"], false, None),
        ]);
        let cancel = AtomicBool::new(false);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert!(result.outcome.is_completed());
        assert_eq!(ids(&result), vec!["a", "b", "c"]);
        assert_eq!(paginator.source().calls(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_keeps_partial_results() {
        let paginator = paginator(vec![
            page(&["a", "b", "c"], true, Some(3)),
            page(&["d", "e"], true, Some(5)),
            Err(FetchError::Http { status: 429 }),
        ]);
        let cancel = AtomicBool::new(false);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert_eq!(ids(&result), vec!["a", "b", "c", "d", "e"]);
        match result.outcome {
            FetchOutcome::PartialFailure { reason, count } => {
                assert_eq!(count, 5);
                assert!(reason.is_rate_limited());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error_is_partial_failure() {
        let paginator = paginator(vec![
            page(&["a"], true, Some(1)),
            Err(FetchError::Decode("garbage".to_string())),
        ]);
        let cancel = AtomicBool::new(false);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert_eq!(ids(&result), vec!["a"]);
        assert!(matches!(
            result.outcome,
            FetchOutcome::PartialFailure {
                reason: FetchError::Decode(_),
                count: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_failure_on_first_page() {
        let paginator = paginator(vec![Err(FetchError::Network("refused".to_string()))]);
        let cancel = AtomicBool::new(false);
        let mut progress = Vec::new();

        let result = paginator.fetch_all("v", &cancel, |n| progress.push(n)).await;

        assert!(result.comments.is_empty());
        assert!(progress.is_empty());
        assert!(matches!(
            result.outcome,
            FetchOutcome::PartialFailure { count: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_first_page() {
        let paginator = paginator(vec![
            page(&["a", "b"], true, Some(2)),
            page(&["c"], true, Some(3)),
            page(&["d"], false, None),
        ]);
        let cancel = AtomicBool::new(false);

        let result = paginator
            .fetch_all("v", &cancel, |_| cancel.store(true, Ordering::SeqCst))
            .await;

        assert!(matches!(result.outcome, FetchOutcome::Cancelled));
        assert_eq!(ids(&result), vec!["a", "b"]);
        assert_eq!(paginator.source().calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start_issues_no_request() {
        let paginator = paginator(vec![page(&["a"], false, None)]);
        let cancel = AtomicBool::new(true);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert!(matches!(result.outcome, FetchOutcome::Cancelled));
        assert!(result.comments.is_empty());
        assert_eq!(paginator.source().calls(), 0);
    }

    #[tokio::test]
    async fn test_cursor_adopted_from_response() {
        let paginator = paginator(vec![
            page(&["a"], true, Some(20)),
            page(&["b"], true, Some(40)),
            page(&["c"], false, Some(60)),
        ]);
        let cancel = AtomicBool::new(false);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert!(result.outcome.is_completed());
        assert_eq!(paginator.source().cursors(), vec![0, 20, 40]);
    }

    #[tokio::test]
    async fn test_has_more_without_cursor_completes() {
        let paginator = paginator(vec![page(&["a"], true, None), page(&["b"], false, None)]);
        let cancel = AtomicBool::new(false);

        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert!(result.outcome.is_completed());
        assert_eq!(ids(&result), vec!["a"]);
        assert_eq!(paginator.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delay_between_pages() {
        let delay = Duration::from_millis(1500);
        let paginator = CommentPaginator::new(
            ScriptedSource::new(vec![
                page(&["a"], true, Some(1)),
                page(&["b"], true, Some(2)),
                page(&["c"], false, None),
            ]),
            delay,
        );
        let cancel = AtomicBool::new(false);

        let started = tokio::time::Instant::now();
        let result = paginator.fetch_all("v", &cancel, |_| {}).await;

        assert!(result.outcome.is_completed());
        // 페이지 3개 → 대기 2번, 마지막 페이지 뒤에는 대기 없음
        let elapsed = started.elapsed();
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 3, "elapsed {:?}", elapsed);
    }
}
