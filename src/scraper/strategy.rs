//! 추출 전략 - HTML에 박힌 JSON 블롭에서 아이템 구조체 찾기
//!
//! 전략은 `(document) -> Option<LocatedItem>` 순수 함수이고,
//! `STRATEGIES` 순서대로 시도하여 처음 값을 돌려준 전략을 채택합니다.
//! 마커 없음, JSON 파싱 실패, 경로 누락은 모두 None (다음 전략으로).

use scraper::{Html, Selector};
use serde_json::Value;

use crate::normalize::to_id;

/// 전략 A: 리하이드레이션 데이터 스크립트 ID
pub const UNIVERSAL_DATA_SCRIPT_ID: &str = "__UNIVERSAL_DATA_FOR_REHYDRATION__";

/// 전략 B: SIGI 상태 스크립트 ID
pub const SIGI_STATE_SCRIPT_ID: &str = "SIGI_STATE";

/// 전략 A에서 아이템 구조체까지의 JSON Pointer
const UNIVERSAL_ITEM_POINTER: &str = "/__DEFAULT_SCOPE__/webapp.video-detail/itemInfo/itemStruct";

/// 전략이 찾은 아이템 구조체
#[derive(Debug, Clone)]
pub struct LocatedItem {
    /// 구조체를 찾는 과정에서 발견된 ID (구조체 내부 ID보다 우선)
    pub id: Option<String>,
    /// 아이템 구조체 (항상 JSON 객체)
    pub item: Value,
}

/// 추출 전략 함수 타입
pub type Strategy = fn(&Html) -> Option<LocatedItem>;

/// 우선순위 순서의 전략 목록
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("universal-data", universal_data),
    ("sigi-state", sigi_state),
];

/// 전략을 순서대로 적용하여 첫 번째 결과 반환
pub fn locate_item(document: &Html) -> Option<(&'static str, LocatedItem)> {
    STRATEGIES.iter().find_map(|(name, strategy)| match strategy(document) {
        Some(found) => {
            tracing::debug!("Strategy {} matched", name);
            Some((*name, found))
        }
        None => {
            tracing::debug!("Strategy {} abandoned", name);
            None
        }
    })
}

/// 전략 A: `__DEFAULT_SCOPE__ → webapp.video-detail → itemInfo → itemStruct`
fn universal_data(document: &Html) -> Option<LocatedItem> {
    let json = script_json(document, UNIVERSAL_DATA_SCRIPT_ID)?;
    let item = json.pointer(UNIVERSAL_ITEM_POINTER)?;
    if !item.is_object() {
        return None;
    }

    // ID 없는 구조체는 쓸 수 없으므로 다음 전략에 넘김
    let Some(id) = to_id(item.get("id")) else {
        tracing::debug!("itemStruct has no id");
        return None;
    };

    Some(LocatedItem {
        id: Some(id),
        item: item.clone(),
    })
}

/// 전략 B: `ItemModule`의 첫 번째 키 = 영상 ID, 값 = 아이템 구조체
fn sigi_state(document: &Html) -> Option<LocatedItem> {
    let json = script_json(document, SIGI_STATE_SCRIPT_ID)?;
    let module = json.get("ItemModule")?.as_object()?;

    // preserve_order: 문서에 나온 순서 그대로의 첫 키
    let (key, item) = module.iter().next()?;
    if !item.is_object() {
        return None;
    }

    Some(LocatedItem {
        id: Some(key.trim().to_string()).filter(|k| !k.is_empty()),
        item: item.clone(),
    })
}

/// `<script id="...">` 본문을 JSON으로 파싱
fn script_json(document: &Html, script_id: &str) -> Option<Value> {
    let selector = Selector::parse(&format!("script#{}", script_id)).ok()?;
    let element = document.select(&selector).next()?;
    let raw = element.text().collect::<String>();

    match serde_json::from_str(raw.trim()) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("Failed to parse {} JSON: {}", script_id, e);
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

    fn page(scripts: &[(&str, &str)]) -> Html {
        let body: String = scripts
            .iter()
            .map(|(id, json)| {
                format!(
                    r#"<script id="{}" type="application/json">{}</script>"#,
                    id, json
                )
            })
            .collect();
        Html::parse_document(&format!(
            "<html><head><title>t</title></head><body>{}</body></html>",
            body
        ))
    }

    #[test]
    fn test_universal_data_path() {
        let doc = page(&[(
            UNIVERSAL_DATA_SCRIPT_ID,
            r#"{"__DEFAULT_SCOPE__":{"webapp.video-detail":{"itemInfo":{"itemStruct":{"id":"111","desc":"hi"}}}}}"#,
        )]);
        let (name, found) = locate_item(&doc).expect("strategy A should match");
        assert_eq!(name, "universal-data");
        assert_eq!(found.id.as_deref(), Some("111"));
    }

    #[test]
    fn test_universal_data_missing_path_falls_through() {
        let doc = page(&[
            (
                UNIVERSAL_DATA_SCRIPT_ID,
                r#"{"__DEFAULT_SCOPE__":{"webapp.user-detail":{}}}"#,
            ),
            (SIGI_STATE_SCRIPT_ID, r#"{"ItemModule":{"222":{"id":"222"}}}"#),
        ]);
        let (name, found) = locate_item(&doc).expect("strategy B should match");
        assert_eq!(name, "sigi-state");
        assert_eq!(found.id.as_deref(), Some("222"));
    }

    #[test]
    fn test_universal_item_without_id_falls_through() {
        let doc = page(&[
            (
                UNIVERSAL_DATA_SCRIPT_ID,
                r#"{"__DEFAULT_SCOPE__":{"webapp.video-detail":{"itemInfo":{"itemStruct":{"desc":"x"}}}}}"#,
            ),
            (SIGI_STATE_SCRIPT_ID, r#"{"ItemModule":{"42":{"desc":"y"}}}"#),
        ]);
        let (name, found) = locate_item(&doc).expect("strategy B should match");
        assert_eq!(name, "sigi-state");
        assert_eq!(found.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_sigi_state_first_key_in_document_order() {
        let doc = page(&[(
            SIGI_STATE_SCRIPT_ID,
            r#"{"ItemModule":{"9":{"id":"9"},"1":{"id":"1"}}}"#,
        )]);
        let (_, found) = locate_item(&doc).expect("strategy B should match");
        assert_eq!(found.id.as_deref(), Some("9"));
    }

    #[test]
    fn test_sigi_state_empty_module() {
        let doc = page(&[(SIGI_STATE_SCRIPT_ID, r#"{"ItemModule":{}}"#)]);
        assert!(locate_item(&doc).is_none());
    }

    #[test]
    fn test_non_object_item_is_rejected() {
        let doc = page(&[(
            UNIVERSAL_DATA_SCRIPT_ID,
            r#"{"__DEFAULT_SCOPE__":{"webapp.video-detail":{"itemInfo":{"itemStruct":"gone"}}}}"#,
        )]);
        assert!(locate_item(&doc).is_none());
    }
}
