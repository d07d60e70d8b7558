//! HTTP 모듈 - 업스트림 요청 공통 기반
//!
//! 메타데이터 추출기와 댓글 수집기가 함께 쓰는 GET 요청 + 에러 분류.
//! 재시도는 하지 않습니다. 재시도 여부는 호출자가 결정합니다.

use anyhow::Context;
use thiserror::Error;

use crate::config::HarvestConfig;

/// HTML 문서 요청용 Accept 헤더
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

// ============================================================================
// FetchError
// ============================================================================

/// 업스트림 요청 실패 분류
#[derive(Debug, Error)]
pub enum FetchError {
    /// 전송 계층 실패 (DNS, 연결, 타임아웃, 본문 읽기)
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx가 아닌 응답
    #[error("HTTP error (status {status})")]
    Http { status: u16 },

    /// 응답 본문이 기대한 형식이 아님
    #[error("Decode error: {0}")]
    Decode(String),

    /// HTTP 200이지만 응답 본문에 업스트림 에러 코드가 실림
    #[error("Upstream error (code {code}): {message}")]
    Upstream { code: i64, message: String },
}

impl FetchError {
    /// HTTP 상태 코드 (HTTP 에러일 때만)
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }

    /// 업스트림 rate limit 여부 (429)
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// 브라우저처럼 보이는 HTTP 클라이언트
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// 설정의 User-Agent/타임아웃으로 클라이언트 생성
    pub fn new(config: &HarvestConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .context("HTTP 클라이언트 생성 실패")?;

        Ok(Self { client })
    }

    /// GET 요청 후 본문을 텍스트로 반환
    ///
    /// 2xx가 아니면 상태 코드를 담은 `FetchError::Http`.
    pub async fn get_text(
        &self,
        url: &str,
        headers: &[(&'static str, &'static str)],
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Upstream returned {} for {}", status, url);
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// HTML 문서 요청 (브라우저 Accept 헤더 포함)
    pub async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        self.get_text(
            url,
            &[("Accept", ACCEPT_HTML), ("Accept-Language", ACCEPT_LANGUAGE)],
        )
        .await
    }
}

// ============================================================================
// Test Server
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
