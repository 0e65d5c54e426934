//! 국내 주식 펀더멘털/업종 데이터 수집.
//!
//! 이 crate는 다음을 제공합니다:
//! - KRX OTP 다운로드를 통한 일자별 전종목 PER/PBR/배당수익률 CSV 수집
//! - 네이버 금융 시가총액 목록 페이지 수집
//! - 네이버 금융 업종 등락 현황 및 업종별 구성 종목 수집
//! - 요청 간격 제어 (`RateLimiter`)
//!
//! 모든 결과 테이블은 문자열 열로 이루어진 polars `DataFrame`입니다.
//! 숫자 변환은 호출자가 필요에 맞게 수행합니다.

pub mod collect;
pub mod error;
pub mod frame;
pub mod html;
pub mod provider;
pub mod rate_limit;

pub use collect::{DateRange, FundamentalsCollector, FundamentalsSource, PartialCollection};
pub use error::{DataError, Result};
pub use rate_limit::{FixedDelay, RateLimiter};

// Provider 재내보내기
pub use provider::{
    KrxConfig, KrxFundamentalsFetcher, NaverConfig, NaverFinanceScraper, SectorCompanyMap,
    SectorLink,
};
