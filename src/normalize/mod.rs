//! 정규화 모듈 - 업스트림 JSON 값 강제 변환
//!
//! 업스트림은 같은 필드를 숫자, 숫자 문자열, null 로 번갈아 내려줍니다.
//! 디코드 경계에서 한 번만 정리하고, 나머지 코드는 정리된 타입만 다룹니다.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

// ============================================================================
// Scalar Coercion
// ============================================================================

/// JSON 값을 음이 아닌 정수로 변환
///
/// - 숫자: 음수는 0, 소수점 이하는 버림
/// - 문자열: 앞쪽 숫자만 해석 (`"120"` → 120, `"12.7"` → 12)
/// - null, bool, 누락, 해석 불가: 0
pub fn to_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                v
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
                    _ => 0,
                }
            }
        }
        Some(Value::String(s)) => parse_leading_digits(s),
        _ => 0,
    }
}

/// 문자열 앞부분의 숫자만 해석 (부호가 음수면 0)
fn parse_leading_digits(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('-') {
        return 0;
    }
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u64>().unwrap_or(0)
}

/// "더 있음" 플래그 정규화
///
/// bool, 0/1 정수, 숫자 문자열이 모두 관측되었습니다.
/// true 또는 0이 아닌 값이면 계속 진행합니다.
pub fn to_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.parse::<f64>().map(|f| f != 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

/// 페이지네이션 커서 정규화 (숫자 또는 숫자 문자열)
pub fn to_cursor(value: Option<&Value>) -> Option<u64> {
    match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// 식별자 정규화 (문자열 또는 숫자, 빈 값은 None)
pub fn to_id(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// 선택적 텍스트 필드 (공백뿐인 문자열은 None)
pub fn to_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

// ============================================================================
// Video ID Resolution
// ============================================================================

fn video_path_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(?:video|photo)/(\d+)").ok())
        .as_ref()
}

/// 입력(영상 URL 또는 숫자 ID)에서 영상 ID 추출
///
/// `https://www.tiktok.com/@user/video/7301234567890123456?lang=en` → `7301234567890123456`
pub fn resolve_video_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(trimmed.to_string());
    }

    video_path_regex()?
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ============================================================================
// Tests
// ============================================================================
