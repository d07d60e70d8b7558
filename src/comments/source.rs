//! 댓글 페이지 소스 - 커서 기반 댓글 목록 API
//!
//! `CommentSource`는 한 페이지 요청만 책임집니다.
//! 누적, 중복 제거, 페이싱은 `CommentPaginator`의 몫입니다.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::Comment;
use crate::config::HarvestConfig;
use crate::http::{FetchError, HttpClient};
use crate::normalize::{to_cursor, to_flag};

/// 페이지당 댓글 수 (업스트림 프로토콜 상수)
pub const PAGE_SIZE: u32 = 50;

/// 업스트림 웹 앱 ID
pub const APP_ID: &str = "1988";

/// 응답 언어 태그
pub const APP_LANGUAGE: &str = "en";

const REFERER: &str = "https://www.tiktok.com/";

// ============================================================================
// CommentPage
// ============================================================================

/// 디코드된 댓글 한 페이지
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    /// 응답 순서 그대로의 댓글 (cid 없는 항목은 제외됨)
    pub comments: Vec<Comment>,
    /// 정규화된 "더 있음" 플래그
    pub has_more: bool,
    /// 다음 요청에 쓸 커서
    pub cursor: Option<u64>,
}

impl CommentPage {
    /// 다음 페이지 커서 (종료면 None)
    ///
    /// `has_more`가 true여도 커서가 없으면 더 진행할 수 없으므로 종료.
    pub fn next_cursor(&self) -> Option<u64> {
        if !self.has_more {
            return None;
        }
        if self.cursor.is_none() {
            tracing::warn!("has_more set but no cursor supplied, stopping");
        }
        self.cursor
    }
}

/// 응답 본문을 `CommentPage`로 디코드
pub fn decode_page(body: &str) -> Result<CommentPage, FetchError> {
    let json: Value = serde_json::from_str(body)?;
    let obj = json
        .as_object()
        .ok_or_else(|| FetchError::Decode("response is not a JSON object".to_string()))?;

    if let Some(code) = obj.get("status_code").and_then(Value::as_i64) {
        if code != 0 {
            let message = obj
                .get("status_msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(FetchError::Upstream { code, message });
        }
    }

    let comments = match obj.get("comments") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|raw| {
                let comment = Comment::from_value(raw);
                if comment.is_none() {
                    tracing::debug!("Skipping comment entry without cid");
                }
                comment
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::warn!("Ignoring non-array comments field: {}", other);
            Vec::new()
        }
    };

    Ok(CommentPage {
        comments,
        has_more: to_flag(obj.get("has_more")),
        cursor: to_cursor(obj.get("cursor")),
    })
}

// ============================================================================
// CommentSource Trait
// ============================================================================

/// 댓글 페이지 소스 트레이트
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// 커서 위치의 한 페이지 요청
    async fn fetch_page(&self, video_id: &str, cursor: u64) -> Result<CommentPage, FetchError>;

    /// 소스 이름 (로그용)
    fn name(&self) -> &str;
}

// ============================================================================
// HttpCommentSource
// ============================================================================

/// TikTok 댓글 목록 API 소스
pub struct HttpCommentSource {
    http: HttpClient,
    endpoint: Url,
}

impl HttpCommentSource {
    /// 설정에서 생성
    pub fn new(config: &HarvestConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.comment_api_url)
            .with_context(|| format!("잘못된 댓글 API URL: {}", config.comment_api_url))?;
        Ok(Self {
            http: HttpClient::new(config)?,
            endpoint,
        })
    }

    /// 요청 URL 구성 (모든 프로토콜 파라미터 포함)
    pub fn page_url(&self, video_id: &str, cursor: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("aweme_id", video_id)
            .append_pair("cursor", &cursor.to_string())
            .append_pair("count", &PAGE_SIZE.to_string())
            .append_pair("aid", APP_ID)
            .append_pair("app_language", APP_LANGUAGE);
        url
    }
}

#[async_trait]
impl CommentSource for HttpCommentSource {
    async fn fetch_page(&self, video_id: &str, cursor: u64) -> Result<CommentPage, FetchError> {
        let url = self.page_url(video_id, cursor);
        let body = self
            .http
            .get_text(url.as_str(), &[("Referer", REFERER)])
            .await?;
        decode_page(&body)
    }

    fn name(&self) -> &str {
        "tiktok-comment-list"
    }
}

// ============================================================================
// Tests
// ============================================================================
