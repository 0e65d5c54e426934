//! 수집 통계 구조체.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// 수집 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 처리 단위 수 (날짜, 페이지, 업종)
    pub units: usize,
    /// 결과 행 수
    pub rows: usize,
    /// 결과 열 수
    pub columns: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 결과 테이블 기준 통계
    pub fn from_frame(units: usize, df: &DataFrame, started: Instant) -> Self {
        Self {
            units,
            rows: df.height(),
            columns: df.width(),
            elapsed: started.elapsed(),
        }
    }

    /// 단위당 평균 행 수
    pub fn rows_per_unit(&self) -> f64 {
        if self.units == 0 {
            0.0
        } else {
            self.rows as f64 / self.units as f64
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            units = self.units,
            rows = self.rows,
            columns = self.columns,
            rows_per_unit = format!("{:.1}", self.rows_per_unit()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
