//! 수집 세션 - 한 번의 `fetch_all` 호출 동안의 가변 상태
//!
//! 세션은 루프 하나가 독점합니다. 외부로 노출되는 것은 종료 후의 결과뿐.

use std::collections::HashSet;

use super::{Comment, CommentFetchResult, FetchOutcome};
use crate::http::FetchError;

/// 세션 상태
#[derive(Debug)]
enum SessionState {
    Running,
    Finished(FetchOutcome),
}

/// 댓글 수집 세션
#[derive(Debug)]
pub struct FetchSession {
    comments: Vec<Comment>,
    seen: HashSet<String>,
    cursor: u64,
    state: SessionState,
}

impl Default for FetchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchSession {
    /// 커서 0에서 시작하는 빈 세션
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            state: SessionState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Running)
    }

    /// 현재 커서
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// 누적된 (중복 제거된) 댓글 수
    pub fn count(&self) -> usize {
        self.comments.len()
    }

    /// 페이지 댓글 흡수: 이미 본 ID는 버리고 나머지를 응답 순서대로 추가
    ///
    /// 새로 추가된 수를 반환합니다.
    pub fn absorb(&mut self, page: Vec<Comment>) -> usize {
        let before = self.comments.len();
        for comment in page {
            if self.seen.insert(comment.id.clone()) {
                self.comments.push(comment);
            }
        }
        self.comments.len() - before
    }

    /// 업스트림이 준 다음 커서 채택
    pub fn advance(&mut self, next: u64) {
        if next <= self.cursor {
            tracing::warn!("Cursor did not advance ({} -> {})", self.cursor, next);
        }
        self.cursor = next;
    }

    pub fn complete(&mut self) {
        self.finish(FetchOutcome::Completed);
    }

    pub fn cancel(&mut self) {
        self.finish(FetchOutcome::Cancelled);
    }

    /// 실패로 종료 (누적분은 유지)
    pub fn fail(&mut self, reason: FetchError) {
        let count = self.count();
        self.finish(FetchOutcome::PartialFailure { reason, count });
    }

    fn finish(&mut self, outcome: FetchOutcome) {
        if self.is_running() {
            self.state = SessionState::Finished(outcome);
        }
    }

    /// 세션을 결과로 변환
    ///
    /// 종료 전에 변환되면 호출자가 중단한 것으로 보고 `Cancelled`.
    pub fn into_result(self) -> CommentFetchResult {
        let outcome = match self.state {
            SessionState::Finished(outcome) => outcome,
            SessionState::Running => FetchOutcome::Cancelled,
        };

        CommentFetchResult {
            comments: self.comments,
            outcome,
        }
    }
}
