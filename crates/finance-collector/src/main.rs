//! 데이터 수집기 CLI.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use finance_collector::{modules, CollectorConfig, CollectorError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "finance-collector")]
#[command(about = "KRX / Naver Finance Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// KRX 기간 펀더멘털 수집 (PER/PBR/배당수익률 CSV)
    KrxFundamentals {
        /// 시작일 (YYYY-MM-DD, 포함)
        #[arg(long)]
        from: NaiveDate,

        /// 종료일 (YYYY-MM-DD, 포함)
        #[arg(long)]
        to: NaiveDate,

        /// 날짜 간 대기 시간 (초, 미지정 시 KRX_REQUEST_INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// 실패 시 그때까지 수집한 결과를 출력
        #[arg(long)]
        keep_partial: bool,
    },

    /// 네이버 금융 시가총액 목록 수집
    MarketSum {
        /// 페이지 간 대기 시간 (초, 미지정 시 NAVER_REQUEST_INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// 최대 페이지 수 (미지정 시 NAVER_MAX_PAGES)
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// 업종별 등락 현황
    SectorPerformance,

    /// 업종별 구성 종목 (JSON)
    SectorCompanies {
        /// 업종 간 대기 시간 (초, 미지정 시 SECTOR_REQUEST_INTERVAL_SECS)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화 (stdout은 결과 출력용이므로 로그는 stderr)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "finance_collector={level},finance_data={level}",
                    level = cli.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Finance Data Collector 시작");

    // 설정 로드
    let mut config = CollectorConfig::from_env()?;
    tracing::debug!(?config, "설정 로드 완료");

    let stdout = std::io::stdout();

    // 명령 실행
    match cli.command {
        Commands::KrxFundamentals {
            from,
            to,
            interval_secs,
            keep_partial,
        } => {
            if from > to {
                tracing::warn!(from = %from, to = %to, "시작일이 종료일보다 늦어 빈 결과를 출력합니다");
            }
            if let Some(secs) = interval_secs {
                config.krx.request_interval_secs = secs;
            }

            let mut collection =
                modules::collect_krx_fundamentals(&config, from, to, keep_partial).await?;
            modules::write_csv(&mut collection.table, stdout.lock())?;
            collection.stats.log_summary("KRX 펀더멘털 수집");

            if let Some((date, e)) = collection.failure {
                tracing::error!(date = %date, "수집 실패로 부분 결과만 출력됨");
                return Err(CollectorError::from(e).into());
            }
        }
        Commands::MarketSum {
            interval_secs,
            max_pages,
        } => {
            if let Some(secs) = interval_secs {
                config.naver.request_interval_secs = secs;
            }
            let max_pages = max_pages.unwrap_or(config.naver.max_pages);
            if max_pages == 0 {
                return Err(
                    CollectorError::Config("--max-pages는 0보다 커야 합니다".to_string()).into(),
                );
            }

            let (mut table, stats) = modules::collect_market_sum(&config, max_pages).await?;
            modules::write_csv(&mut table, stdout.lock())?;
            stats.log_summary("시가총액 목록 수집");
        }
        Commands::SectorPerformance => {
            let (mut table, stats) = modules::collect_sector_performance(&config).await?;
            modules::write_csv(&mut table, stdout.lock())?;
            stats.log_summary("업종 등락 현황 수집");
        }
        Commands::SectorCompanies { interval_secs } => {
            if let Some(secs) = interval_secs {
                config.naver.sector_interval_secs = secs;
            }

            let (sectors, stats) = modules::collect_sector_companies(&config).await?;
            modules::write_json(&sectors, stdout.lock())?;
            stats.log_summary("업종 구성 종목 수집");
        }
    }

    tracing::info!("Finance Data Collector 종료");

    Ok(())
}
