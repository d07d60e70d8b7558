//! 댓글 CSV 내보내기
//!
//! 스프레드시트에서 한글/이모지가 깨지지 않도록 UTF-8 BOM을 앞에 붙입니다.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::Comment;
use crate::config::get_data_dir;

/// CSV 헤더
pub const CSV_HEADERS: [&str; 6] = ["Comment ID", "User", "Date", "Comment", "Likes", "Replies"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 기본 내보내기 경로 (~/.palank-harvest/exports/tiktok_comments_<id>.csv)
pub fn default_export_path(video_id: &str) -> PathBuf {
    get_data_dir()
        .join("exports")
        .join(format!("tiktok_comments_{}.csv", video_id))
}

/// 댓글을 CSV로 기록
pub fn write_csv<W: Write>(mut writer: W, comments: &[Comment]) -> Result<()> {
    writer.write_all(UTF8_BOM).context("BOM 기록 실패")?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;

    for comment in comments {
        let date = comment.created_at.format(DATE_FORMAT).to_string();
        let likes = comment.like_count.to_string();
        let replies = comment.reply_count.to_string();

        csv_writer.write_record([
            comment.id.as_str(),
            comment.author.as_str(),
            date.as_str(),
            comment.text.as_str(),
            likes.as_str(),
            replies.as_str(),
        ])?;
    }

    csv_writer.flush().context("CSV flush 실패")?;
    Ok(())
}

/// 댓글을 CSV 파일로 저장 (상위 디렉토리 자동 생성)
pub fn export_csv(path: &Path, comments: &[Comment]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write_csv(std::io::BufWriter::new(file), comments)?;

    tracing::info!("Exported {} comments to {:?}", comments.len(), path);
    Ok(())
}
