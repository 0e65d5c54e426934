//! 기간 단위 펀더멘털 수집.
//!
//! 하루 단위 데이터 소스([`FundamentalsSource`])를 시작일부터 종료일까지
//! 하루씩 순서대로 호출하고, 데이터가 있는 날의 테이블만 이어 붙입니다.
//!
//! ```rust,ignore
//! let fetcher = KrxFundamentalsFetcher::new(KrxConfig::default())?;
//! let collector = FundamentalsCollector::new(fetcher);
//! let table = collector
//!     .collect(from, to, &FixedDelay::from_secs(2))
//!     .await?;
//! ```

use crate::error::{DataError, Result};
use crate::frame;
use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::{debug, info, warn};

/// 특정 거래일의 펀더멘털 테이블을 제공하는 소스.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// 해당 날짜의 전종목 펀더멘털 조회
    async fn fetch(&self, date: NaiveDate) -> Result<DataFrame>;
}

/// 시작일과 종료일을 포함하는 날짜 구간.
///
/// `iter()`를 호출할 때마다 처음부터 다시 순회합니다.
/// `from > to`이면 빈 구간입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// 포함되는 날짜 수
    pub fn len(&self) -> usize {
        if self.from > self.to {
            0
        } else {
            (self.to - self.from).num_days() as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 오름차순 날짜 순회
    pub fn iter(&self) -> DateRangeIter {
        DateRangeIter {
            next: (self.from <= self.to).then_some(self.from),
            to: self.to,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DateRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// [`DateRange`] 순회자.
#[derive(Debug, Clone)]
pub struct DateRangeIter {
    next: Option<NaiveDate>,
    to: NaiveDate,
}

impl Iterator for DateRangeIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.to);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map(|d| (self.to - d).num_days() as usize + 1)
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DateRangeIter {}

/// 중간 실패 시까지 수집된 결과.
#[derive(Debug)]
pub struct PartialCollection {
    /// 실패 이전까지 수집된 테이블 (날짜 순)
    pub table: DataFrame,
    /// 처리 완료된 날짜 수
    pub completed_days: usize,
    /// 첫 실패 날짜와 오류 (없으면 전체 구간 완료)
    pub failure: Option<(NaiveDate, DataError)>,
}

impl PartialCollection {
    /// 전체 구간이 실패 없이 끝났는지
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// 기간 펀더멘털 수집기.
pub struct FundamentalsCollector<S> {
    source: S,
}

impl<S: FundamentalsSource> FundamentalsCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// 내부 데이터 소스
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 구간 전체 수집.
    ///
    /// 하루라도 실패하면 전체가 실패합니다 (부분 결과 없음).
    /// 데이터 유무와 관계없이 매 날짜 처리 후 `limiter.wait()`를 호출합니다.
    pub async fn collect(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limiter: &dyn RateLimiter,
    ) -> Result<DataFrame> {
        self.collect_with_progress(from, to, limiter, |_, _| {}).await
    }

    /// 진행 상황 콜백과 함께 구간 전체 수집
    ///
    /// # Arguments
    /// * `progress_callback` - 날짜 하나를 처리할 때마다 (처리 수, 전체 수)
    pub async fn collect_with_progress<F>(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limiter: &dyn RateLimiter,
        mut progress_callback: F,
    ) -> Result<DataFrame>
    where
        F: FnMut(usize, usize),
    {
        let range = DateRange::new(from, to);
        let total = range.len();
        let mut tables = Vec::new();

        for (i, date) in range.iter().enumerate() {
            let table = self.source.fetch(date).await?;
            self.accumulate(date, table, &mut tables);
            progress_callback(i + 1, total);
            limiter.wait().await;
        }

        let combined = frame::concat(tables)?;
        info!(
            from = %from,
            to = %to,
            days = total,
            rows = combined.height(),
            "기간 펀더멘털 수집 완료"
        );
        Ok(combined)
    }

    /// 첫 실패에서 멈추고 그때까지의 결과를 반환하는 수집.
    ///
    /// [`collect`](Self::collect)와 같은 순서/대기 규칙을 따르며,
    /// 실패한 날짜 이후로는 요청하지 않습니다.
    pub async fn collect_partial<F>(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limiter: &dyn RateLimiter,
        mut progress_callback: F,
    ) -> Result<PartialCollection>
    where
        F: FnMut(usize, usize),
    {
        let range = DateRange::new(from, to);
        let total = range.len();
        let mut tables = Vec::new();
        let mut completed_days = 0;
        let mut failure = None;

        for date in range {
            match self.source.fetch(date).await {
                Ok(table) => self.accumulate(date, table, &mut tables),
                Err(e) => {
                    warn!(date = %date, error = %e, "펀더멘털 조회 실패, 수집 중단");
                    failure = Some((date, e));
                    break;
                }
            }
            completed_days += 1;
            progress_callback(completed_days, total);
            limiter.wait().await;
        }

        Ok(PartialCollection {
            table: frame::concat(tables)?,
            completed_days,
            failure,
        })
    }

    fn accumulate(&self, date: NaiveDate, table: DataFrame, tables: &mut Vec<DataFrame>) {
        if table.height() > 0 {
            debug!(date = %date, rows = table.height(), "펀더멘털 수집");
            tables.push(table);
        } else {
            debug!(date = %date, "데이터 없음 (휴장일)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table_of(rows: usize, tag: &str) -> DataFrame {
        let mut csv = String::from("code,tag\n");
        for i in 0..rows {
            csv.push_str(&format!("{:06},{}\n", i, tag));
        }
        frame::read_csv(csv.into_bytes()).unwrap()
    }

    /// 날짜별로 정해진 행 수를 돌려주는 가짜 소스
    struct ScriptedSource {
        rows: Vec<usize>,
        start: NaiveDate,
        fail_on: Option<NaiveDate>,
        calls: Mutex<Vec<NaiveDate>>,
    }

    impl ScriptedSource {
        fn new(start: NaiveDate, rows: Vec<usize>) -> Self {
            Self {
                rows,
                start,
                fail_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<NaiveDate> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FundamentalsSource for ScriptedSource {
        async fn fetch(&self, date: NaiveDate) -> Result<DataFrame> {
            self.calls.lock().unwrap().push(date);
            if self.fail_on == Some(date) {
                return Err(DataError::RateLimited("test".to_string()));
            }
            let index = (date - self.start).num_days() as usize;
            let rows = self.rows.get(index).copied().unwrap_or(0);
            Ok(table_of(rows, &date.format("%Y%m%d").to_string()))
        }
    }

    #[derive(Default)]
    struct CountingLimiter {
        waits: AtomicUsize,
    }

    #[async_trait]
    impl RateLimiter for CountingLimiter {
        async fn wait(&self) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_date_range_len_and_order() {
        let range = DateRange::new(date(2024, 2, 27), date(2024, 3, 2));

        let dates: Vec<_> = range.iter().collect();

        assert_eq!(range.len(), 5);
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[2], date(2024, 2, 29));
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        // 재시작 가능
        assert_eq!(range.iter().count(), 5);
    }

    #[test]
    fn test_date_range_reversed_is_empty() {
        let range = DateRange::new(date(2024, 1, 5), date(2024, 1, 1));

        assert!(range.is_empty());
        assert_eq!(range.iter().next(), None);
    }

    #[tokio::test]
    async fn test_collect_skips_empty_days() {
        let start = date(2024, 1, 2);
        let collector = FundamentalsCollector::new(ScriptedSource::new(start, vec![10, 0, 7]));
        let limiter = CountingLimiter::default();

        let df = collector
            .collect(start, date(2024, 1, 4), &limiter)
            .await
            .unwrap();

        assert_eq!(df.height(), 17);
        let tags = frame::column_values(&df, "tag").unwrap();
        assert!(tags[..10].iter().all(|t| t == "20240102"));
        assert!(tags[10..].iter().all(|t| t == "20240104"));
        assert_eq!(limiter.waits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_collect_calls_once_per_day_in_order() {
        let start = date(2023, 12, 30);
        let collector = FundamentalsCollector::new(ScriptedSource::new(start, vec![1; 5]));

        let mut progress = Vec::new();
        collector
            .collect_with_progress(start, date(2024, 1, 3), &CountingLimiter::default(), |done, total| {
                progress.push((done, total))
            })
            .await
            .unwrap();

        let calls = collector.source().calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls.first(), Some(&start));
        assert_eq!(calls.last(), Some(&date(2024, 1, 3)));
        assert!(calls.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
    }

    #[tokio::test]
    async fn test_collect_single_day() {
        let day = date(2024, 1, 2);

        let collector = FundamentalsCollector::new(ScriptedSource::new(day, vec![4]));
        let df = collector
            .collect(day, day, &CountingLimiter::default())
            .await
            .unwrap();
        assert_eq!(collector.source().calls(), vec![day]);
        assert_eq!(df.height(), 4);

        let empty = FundamentalsCollector::new(ScriptedSource::new(day, vec![0]));
        let df = empty
            .collect(day, day, &CountingLimiter::default())
            .await
            .unwrap();
        assert_eq!(empty.source().calls().len(), 1);
        assert_eq!(df.height(), 0);
    }

    #[tokio::test]
    async fn test_collect_reversed_range_returns_empty_table() {
        let collector =
            FundamentalsCollector::new(ScriptedSource::new(date(2024, 1, 1), vec![3, 3]));
        let limiter = CountingLimiter::default();

        let df = collector
            .collect(date(2024, 1, 2), date(2024, 1, 1), &limiter)
            .await
            .unwrap();

        assert_eq!(df.height(), 0);
        assert!(collector.source().calls().is_empty());
        assert_eq!(limiter.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_collect_aborts_on_failure() {
        let start = date(2024, 1, 2);
        let mut source = ScriptedSource::new(start, vec![5, 5, 5]);
        source.fail_on = Some(date(2024, 1, 3));
        let collector = FundamentalsCollector::new(source);

        let result = collector
            .collect(start, date(2024, 1, 4), &CountingLimiter::default())
            .await;

        assert!(matches!(result, Err(DataError::RateLimited(_))));
        assert_eq!(collector.source().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_partial_keeps_completed_days() {
        let start = date(2024, 1, 2);
        let mut source = ScriptedSource::new(start, vec![5, 0, 5, 5]);
        source.fail_on = Some(date(2024, 1, 5));
        let collector = FundamentalsCollector::new(source);
        let limiter = CountingLimiter::default();

        let partial = collector
            .collect_partial(start, date(2024, 1, 5), &limiter, |_, _| {})
            .await
            .unwrap();

        assert!(!partial.is_complete());
        assert_eq!(partial.completed_days, 3);
        assert_eq!(partial.table.height(), 10);
        let (failed_on, _) = partial.failure.unwrap();
        assert_eq!(failed_on, date(2024, 1, 5));
        assert_eq!(limiter.waits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_collect_partial_without_failure_is_complete() {
        let start = date(2024, 1, 2);
        let collector = FundamentalsCollector::new(ScriptedSource::new(start, vec![2, 2]));

        let partial = collector
            .collect_partial(start, date(2024, 1, 3), &CountingLimiter::default(), |_, _| {})
            .await
            .unwrap();

        assert!(partial.is_complete());
        assert_eq!(partial.completed_days, 2);
        assert_eq!(partial.table.height(), 4);
    }
}
