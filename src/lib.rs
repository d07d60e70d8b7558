//! palank-harvest - TikTok 영상 메타데이터 + 댓글 수집기
//!
//! 비공개/수시로 바뀌는 업스트림을 상대로 하는 수집 엔진입니다.
//! - 영상 페이지 HTML에서 다중 전략으로 메타데이터 추출
//! - 커서 페이지네이션 API에서 댓글 전체를 중복 없이 수집

pub mod cli;
pub mod comments;
pub mod config;
pub mod http;
pub mod normalize;
pub mod scraper;

// Re-exports
pub use crate::comments::{
    Comment, CommentFetchResult, CommentPage, CommentPaginator, CommentSource, FetchOutcome,
    FetchSession, HttpCommentSource,
};
pub use crate::config::{get_data_dir, HarvestConfig};
pub use crate::http::{FetchError, HttpClient};
pub use crate::scraper::{extract_from_html, ScrapedVideoData, VideoExtractor, VideoStats};
