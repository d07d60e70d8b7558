//! 웹 스크래퍼 모듈 - TikTok 영상 페이지에서 메타데이터 추출
//!
//! 페이지 HTML에 박힌 JSON 블롭을 여러 전략으로 찾아 정규화합니다.
//! 네트워크/HTTP 실패는 에러로, "가져왔지만 데이터 없음"은 `None`으로 구분합니다.

mod strategy;

use anyhow::Result;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::HarvestConfig;
use crate::http::{FetchError, HttpClient};
use crate::normalize::{to_count, to_id, to_text};

pub use strategy::{LocatedItem, Strategy, SIGI_STATE_SCRIPT_ID, STRATEGIES, UNIVERSAL_DATA_SCRIPT_ID};

// ============================================================================
// Types
// ============================================================================

/// 영상 통계 (모두 음이 아닌 정수, 누락 시 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    /// 좋아요 수
    pub digg_count: u64,
    pub share_count: u64,
    pub comment_count: u64,
    pub play_count: u64,
    /// 저장 수
    pub collect_count: u64,
}

impl VideoStats {
    /// `stats` 객체에서 생성 (없으면 전부 0)
    pub fn from_value(stats: Option<&Value>) -> Self {
        let field = |name: &str| to_count(stats.and_then(|s| s.get(name)));

        Self {
            digg_count: field("diggCount"),
            share_count: field("shareCount"),
            comment_count: field("commentCount"),
            play_count: field("playCount"),
            collect_count: field("collectCount"),
        }
    }
}

/// 스크랩된 영상 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedVideoData {
    /// 업스트림 영상 ID
    pub id: String,
    pub stats: VideoStats,
    /// 영상 설명 (제목)
    pub title: Option<String>,
    /// 커버 이미지 URL
    pub cover: Option<String>,
    /// 작성자 닉네임
    pub author: Option<String>,
}

// ============================================================================
// VideoExtractor
// ============================================================================

/// 영상 메타데이터 추출기
pub struct VideoExtractor {
    http: HttpClient,
}

impl VideoExtractor {
    /// 새 추출기 생성
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// 기존 HTTP 클라이언트 공유
    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    /// URL에서 영상 메타데이터 추출
    ///
    /// - `Ok(Some(_))`: 추출 성공
    /// - `Ok(None)`: 문서는 받았지만 인식 가능한 데이터 없음
    /// - `Err(_)`: 네트워크 또는 HTTP 실패
    pub async fn extract(&self, url: &str) -> Result<Option<ScrapedVideoData>, FetchError> {
        tracing::info!("Scraping: {}", url);

        let html = self.http.get_html(url).await?;
        let data = extract_from_html(&html);

        if data.is_none() {
            tracing::warn!("No embedded video data found: {}", url);
        }

        Ok(data)
    }
}

/// HTML 문서에서 영상 데이터 추출 (네트워크 없음)
pub fn extract_from_html(html: &str) -> Option<ScrapedVideoData> {
    let document = Html::parse_document(html);
    let (strategy, located) = strategy::locate_item(&document)?;
    tracing::debug!("Video data located by {}", strategy);

    normalize_item(located)
}

/// 아이템 구조체를 안정된 스키마로 정규화
fn normalize_item(located: LocatedItem) -> Option<ScrapedVideoData> {
    let item = &located.item;

    // 찾는 과정에서 얻은 ID가 구조체 내부 ID보다 우선
    let id = match located.id.or_else(|| to_id(item.get("id"))) {
        Some(id) => id,
        None => {
            tracing::warn!("Item struct has no resolvable id");
            return None;
        }
    };

    let author = match item.get("author") {
        Some(Value::Object(author)) => to_text(author.get("nickname")),
        // SIGI 레이아웃: author는 계정 ID 문자열, 닉네임은 최상위
        _ => to_text(item.get("nickname")),
    };

    Some(ScrapedVideoData {
        id,
        stats: VideoStats::from_value(item.get("stats")),
        title: to_text(item.get("desc")),
        cover: to_text(item.pointer("/video/cover")),
        author,
    })
}

// ============================================================================
// Tests
// ============================================================================
