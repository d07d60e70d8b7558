//! 설정 모듈 - 환경변수 기반 수집기 설정
//!
//! 업스트림 프로토콜 상수(페이지 크기, 앱 ID 등)는 여기 두지 않습니다.
//! 여기에는 운영 환경마다 달라질 수 있는 값만 둡니다.

use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// 브라우저 User-Agent (비브라우저 요청은 축소/차단 응답을 받음)
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// HTTP 요청 타임아웃 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 댓글 페이지 사이 대기 시간 (ms)
pub const DEFAULT_PAGE_DELAY_MS: u64 = 1500;

/// 댓글 목록 API 엔드포인트
pub const DEFAULT_COMMENT_API_URL: &str = "https://www.tiktok.com/api/comment/list/";

const ENV_USER_AGENT: &str = "PALANK_HARVEST_USER_AGENT";
const ENV_TIMEOUT_SECS: &str = "PALANK_HARVEST_TIMEOUT_SECS";
const ENV_PAGE_DELAY_MS: &str = "PALANK_HARVEST_PAGE_DELAY_MS";
const ENV_COMMENT_API: &str = "PALANK_HARVEST_COMMENT_API";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.palank-harvest/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".palank-harvest")
}

// ============================================================================
// HarvestConfig
// ============================================================================

/// 수집기 설정
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// 모든 요청에 붙는 User-Agent
    pub user_agent: String,
    /// 요청 타임아웃
    pub timeout: Duration,
    /// 댓글 페이지 사이 대기 시간 (업스트림 rate limit 회피용)
    pub page_delay: Duration,
    /// 댓글 목록 API 엔드포인트
    pub comment_api_url: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            comment_api_url: DEFAULT_COMMENT_API_URL.to_string(),
        }
    }
}

impl HarvestConfig {
    /// 환경변수에서 설정 로드
    ///
    /// 잘못된 값은 경고 후 기본값을 사용합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 임의의 키-값 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ua) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            config.user_agent = ua;
        }

        if let Some(secs) = parse_u64(&lookup, ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(ms) = parse_u64(&lookup, ENV_PAGE_DELAY_MS) {
            config.page_delay = Duration::from_millis(ms);
        }

        if let Some(api) = lookup(ENV_COMMENT_API).filter(|v| !v.trim().is_empty()) {
            match url::Url::parse(api.trim()) {
                Ok(_) => config.comment_api_url = api.trim().to_string(),
                Err(e) => tracing::warn!("{} 무시 (잘못된 URL: {}): {}", ENV_COMMENT_API, e, api),
            }
        }

        config
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_comment_api_url(mut self, url: impl Into<String>) -> Self {
        self.comment_api_url = url.into();
        self
    }
}

fn parse_u64<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("{} 무시 (숫자가 아님): {}", name, raw);
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HarvestConfig::default();
        assert_eq!(config.page_delay, Duration::from_millis(1500));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.comment_api_url, DEFAULT_COMMENT_API_URL);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = HarvestConfig::from_lookup(lookup_from(&[
            (ENV_PAGE_DELAY_MS, "250"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_COMMENT_API, "http://127.0.0.1:8080/api/comment/list/"),
        ]));
        assert_eq!(config.page_delay, Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.comment_api_url, "http://127.0.0.1:8080/api/comment/list/");
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = HarvestConfig::from_lookup(lookup_from(&[
            (ENV_PAGE_DELAY_MS, "soon"),
            (ENV_COMMENT_API, "not a url"),
            (ENV_USER_AGENT, "   "),
        ]));
        assert_eq!(config.page_delay, Duration::from_millis(DEFAULT_PAGE_DELAY_MS));
        assert_eq!(config.comment_api_url, DEFAULT_COMMENT_API_URL);
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
    }

    #[test]
    fn test_data_dir_name() {
        assert!(get_data_dir().ends_with(".palank-harvest"));
    }
}
