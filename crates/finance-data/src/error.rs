//! 데이터 수집 오류 타입.

use polars::prelude::PolarsError;
use thiserror::Error;

/// 데이터 수집 관련 오류.
///
/// 어떤 오류도 자동으로 재시도하지 않습니다. 호출자가 로깅/재시도를 결정합니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP 전송 오류 (연결 실패, 타임아웃 등)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 요청 한도 초과 (HTTP 429)
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// CSV/테이블 처리 오류
    ///
    /// 만료되었거나 잘못된 OTP로 받은 빈 CSV도 여기로 들어옵니다.
    #[error("Table error: {0}")]
    Frame(#[from] PolarsError),

    /// 페이지에서 기대한 테이블을 찾을 수 없음 (레이아웃 변경)
    #[error("Table not found: {locator} ({found} tables on page)")]
    TableNotFound { locator: String, found: usize },

    /// HTML 구조/URL 파싱 오류
    #[error("Parse error: {0}")]
    Parse(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DataError>;
