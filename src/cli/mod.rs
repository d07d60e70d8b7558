//! CLI 모듈
//!
//! palank-harvest CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::comments::{default_export_path, export_csv, CommentPaginator, FetchOutcome};
use crate::config::{get_data_dir, HarvestConfig};
use crate::http::HttpClient;
use crate::normalize::resolve_video_id;
use crate::scraper::{ScrapedVideoData, VideoExtractor};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "palank-harvest")]
#[command(version, about = "TikTok 영상 메타데이터 + 댓글 수집기", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 영상 페이지에서 메타데이터 추출
    Video {
        /// 영상 URL
        url: String,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 여러 영상의 통계를 순차적으로 갱신
    Stats {
        /// 영상 URL 목록
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// 영상의 댓글 전체 수집
    Comments {
        /// 영상 ID 또는 URL
        video: String,

        /// CSV 저장 경로 (기본: 데이터 디렉토리)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV 대신 JSON으로 stdout 출력
        #[arg(long)]
        json: bool,
    },

    /// 설정 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = HarvestConfig::from_env();

    match cli.command {
        Commands::Video { url, json } => cmd_video(&config, &url, json).await,
        Commands::Stats { urls } => cmd_stats(&config, &urls).await,
        Commands::Comments {
            video,
            output,
            json,
        } => cmd_comments(&config, &video, output, json).await,
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 메타데이터 추출 명령어 (video)
async fn cmd_video(config: &HarvestConfig, url: &str, json: bool) -> Result<()> {
    let extractor = VideoExtractor::new(config).context("VideoExtractor 생성 실패")?;

    println!("[*] 페이지 요청 중: {}", url);

    let data = extractor
        .extract(url)
        .await
        .context("페이지 요청 실패")?;

    let Some(data) = data else {
        bail!("영상 데이터를 추출할 수 없습니다 (차단되었거나 페이지 구조가 바뀌었을 수 있음): {}", url);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print_video(&data);
    }

    Ok(())
}

/// 통계 갱신 명령어 (stats)
///
/// 업스트림이 동시 요청을 차단하므로 한 번에 하나씩, 사이에 대기를 둡니다.
async fn cmd_stats(config: &HarvestConfig, urls: &[String]) -> Result<()> {
    let http = HttpClient::new(config)?;
    let extractor = VideoExtractor::with_client(http);

    let mut success_count = 0;
    let mut error_count = 0;

    for (i, url) in urls.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(config.page_delay).await;
        }

        print!("[{}/{}] {}... ", i + 1, urls.len(), truncate_text(url, 60));
        let _ = std::io::stdout().flush();

        match extractor.extract(url).await {
            Ok(Some(data)) => {
                println!(
                    "{} | 좋아요 {} | 댓글 {} | 공유 {} | 재생 {} | 저장 {}",
                    data.id,
                    data.stats.digg_count,
                    data.stats.comment_count,
                    data.stats.share_count,
                    data.stats.play_count,
                    data.stats.collect_count
                );
                success_count += 1;
            }
            Ok(None) => {
                println!("데이터 없음");
                error_count += 1;
            }
            Err(e) => {
                println!("실패: {}", e);
                error_count += 1;
            }
        }
    }

    println!();
    println!("[OK] 완료: 성공 {}, 실패 {}", success_count, error_count);

    Ok(())
}

/// 강제 종료 시 종료 코드 (128 + SIGINT)
const EXIT_INTERRUPTED: i32 = 130;

/// 댓글 수집 명령어 (comments)
///
/// Ctrl-C를 누르면 다음 요청 전에 멈추고 그때까지 모은 댓글을 저장합니다.
/// 한 번 더 누르면 저장 없이 즉시 종료합니다.
/// 완료가 아니면 저장 후 에러로 끝나므로 종료 코드가 0이 아닙니다.
async fn cmd_comments(
    config: &HarvestConfig,
    video: &str,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let video_id = resolve_video_id(video)
        .ok_or_else(|| anyhow::anyhow!("영상 ID를 찾을 수 없습니다: {}", video))?;

    let paginator = CommentPaginator::from_config(config).context("CommentPaginator 생성 실패")?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            eprintln!("\n[!] 취소 요청됨, 현재 페이지까지만 수집합니다... (다시 누르면 강제 종료)");
            cancel.store(true, Ordering::SeqCst);

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] 강제 종료");
                std::process::exit(EXIT_INTERRUPTED);
            }
        });
    }

    eprintln!("[*] 댓글 수집 중: {}", video_id);

    let result = paginator
        .fetch_all(&video_id, &cancel, |count| {
            eprint!("\r[*] 수집된 댓글: {}", count);
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();

    match &result.outcome {
        FetchOutcome::Completed => {
            eprintln!("[OK] 수집 완료: {} 건", result.comments.len());
        }
        FetchOutcome::PartialFailure { reason, count } => {
            eprintln!("[!] 수집 중단 ({}), 부분 결과: {} 건", reason, count);
        }
        FetchOutcome::Cancelled => {
            eprintln!("[!] 취소됨, 부분 결과: {} 건", result.comments.len());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result.comments)?);
    } else if result.comments.is_empty() {
        eprintln!("[!] 저장할 댓글이 없습니다.");
    } else {
        let path = output.unwrap_or_else(|| default_export_path(&video_id));
        export_csv(&path, &result.comments).context("CSV 저장 실패")?;
        eprintln!("[OK] CSV 저장: {}", path.display());
    }

    ensure_completed(&result.outcome)
}

/// 완료가 아닌 수집 결과를 에러로 변환 (부분 결과는 이미 저장된 뒤)
fn ensure_completed(outcome: &FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Completed => Ok(()),
        FetchOutcome::PartialFailure { reason, count } => {
            bail!("댓글 수집이 중간에 실패했습니다 ({} 건 저장됨): {}", count, reason)
        }
        FetchOutcome::Cancelled => bail!("댓글 수집이 취소되었습니다"),
    }
}

/// 상태 명령어 (status)
fn cmd_status(config: &HarvestConfig) -> Result<()> {
    println!("palank-harvest v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("[*] 데이터 디렉토리: {}", get_data_dir().display());
    println!("[*] 댓글 API: {}", config.comment_api_url);
    println!("[*] 페이지 간 대기: {} ms", config.page_delay.as_millis());
    println!("[*] 요청 타임아웃: {} s", config.timeout.as_secs());
    println!("[*] User-Agent: {}", truncate_text(&config.user_agent, 60));

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn print_video(data: &ScrapedVideoData) {
    println!("[OK] 영상 #{}", data.id);

    if let Some(ref title) = data.title {
        println!("   제목: {}", truncate_text(title, 80));
    }
    if let Some(ref author) = data.author {
        println!("   작성자: {}", author);
    }
    if let Some(ref cover) = data.cover {
        println!("   커버: {}", cover);
    }

    println!("   좋아요: {}", data.stats.digg_count);
    println!("   댓글: {}", data.stats.comment_count);
    println!("   공유: {}", data.stats.share_count);
    println!("   재생: {}", data.stats.play_count);
    println!("   저장: {}", data.stats.collect_count);
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================
