//! KRX 기간 펀더멘털 수집.

use chrono::NaiveDate;
use finance_data::{DataError, DateRange, FundamentalsCollector, KrxFundamentalsFetcher};
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::{info, warn};

use super::progress;
use crate::{CollectionStats, CollectorConfig, Result};

/// 기간 수집 결과
#[derive(Debug)]
pub struct KrxCollection {
    /// 수집된 테이블
    pub table: DataFrame,
    /// 수집 통계
    pub stats: CollectionStats,
    /// 중간 실패 (부분 결과 모드에서만)
    pub failure: Option<(NaiveDate, DataError)>,
}

/// 기간 펀더멘털 수집.
///
/// `keep_partial`이 꺼져 있으면 하루라도 실패할 때 전체가 실패합니다.
/// 켜져 있으면 실패 직전까지의 테이블과 실패 정보를 함께 반환합니다.
pub async fn collect_krx_fundamentals(
    config: &CollectorConfig,
    from: NaiveDate,
    to: NaiveDate,
    keep_partial: bool,
) -> Result<KrxCollection> {
    info!(from = %from, to = %to, keep_partial, "KRX 펀더멘털 수집 시작");

    let started = Instant::now();
    let fetcher = KrxFundamentalsFetcher::new(config.krx_config())?;
    let collector = FundamentalsCollector::new(fetcher);
    let limiter = config.krx.limiter();

    let pb = progress::progress_bar("KRX 펀더멘털");

    let collection = if keep_partial {
        let partial = collector
            .collect_partial(from, to, &limiter, progress::track(&pb))
            .await?;
        if let Some((date, e)) = &partial.failure {
            warn!(date = %date, error = %e, completed = partial.completed_days, "부분 결과만 수집됨");
        }
        KrxCollection {
            stats: CollectionStats::from_frame(partial.completed_days, &partial.table, started),
            table: partial.table,
            failure: partial.failure,
        }
    } else {
        let table = collector
            .collect_with_progress(from, to, &limiter, progress::track(&pb))
            .await;
        let table = match table {
            Ok(table) => table,
            Err(e) => {
                pb.abandon_with_message("KRX 펀더멘털 수집 실패");
                return Err(e.into());
            }
        };
        KrxCollection {
            stats: CollectionStats::from_frame(DateRange::new(from, to).len(), &table, started),
            table,
            failure: None,
        }
    };

    pb.finish_and_clear();
    Ok(collection)
}
