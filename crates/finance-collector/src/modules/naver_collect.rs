//! 네이버 금융 시가총액/업종 수집.

use finance_data::{NaverFinanceScraper, SectorCompanyMap};
use polars::prelude::DataFrame;
use std::time::{Duration, Instant};
use tracing::info;

use super::progress;
use crate::{CollectionStats, CollectorConfig, Result};

/// 시가총액 목록 전체 수집
pub async fn collect_market_sum(
    config: &CollectorConfig,
    max_pages: usize,
) -> Result<(DataFrame, CollectionStats)> {
    info!(max_pages, "시가총액 목록 수집 시작");

    let started = Instant::now();
    let scraper = NaverFinanceScraper::new(config.naver_config())?;

    let pb = progress::spinner("시가총액 페이지 수집 중...");
    pb.enable_steady_tick(Duration::from_millis(120));
    let mut pages = 0;
    let table = scraper
        .scrape_market_sum_with_progress(&config.naver.limiter(), max_pages, |done, _| {
            pages = done;
            pb.set_message(format!("시가총액 {}페이지 수집", done));
        })
        .await;
    pb.finish_and_clear();
    let table = table?;

    let stats = CollectionStats::from_frame(pages, &table, started);
    Ok((table, stats))
}

/// 업종별 등락 현황 수집
pub async fn collect_sector_performance(
    config: &CollectorConfig,
) -> Result<(DataFrame, CollectionStats)> {
    let started = Instant::now();
    let scraper = NaverFinanceScraper::new(config.naver_config())?;

    let table = scraper.fetch_sector_performance().await?;
    let stats = CollectionStats::from_frame(1, &table, started);
    Ok((table, stats))
}

/// 업종별 구성 종목 수집
pub async fn collect_sector_companies(
    config: &CollectorConfig,
) -> Result<(SectorCompanyMap, CollectionStats)> {
    info!("업종별 구성 종목 수집 시작");

    let started = Instant::now();
    let scraper = NaverFinanceScraper::new(config.naver_config())?;

    let pb = progress::progress_bar("업종 구성 종목");
    let sectors = scraper
        .fetch_sector_companies_with_progress(
            &config.naver.sector_limiter(),
            progress::track(&pb),
        )
        .await;
    pb.finish_and_clear();
    let sectors = sectors?;

    let stats = CollectionStats {
        units: sectors.len(),
        rows: sectors.company_count(),
        columns: 1,
        elapsed: started.elapsed(),
    };
    Ok((sectors, stats))
}
