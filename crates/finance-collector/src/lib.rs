//! KRX / 네이버 금융 데이터 수집기.
//!
//! 이 crate는 수집 결과를 stdout으로 내보내는 바이너리를 제공합니다:
//! - KRX 기간 펀더멘털 수집 (CSV)
//! - 네이버 금융 시가총액 목록 수집 (CSV)
//! - 업종별 등락 현황 (CSV) 및 업종별 구성 종목 (JSON)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::CollectionStats;
