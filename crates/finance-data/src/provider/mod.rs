//! 데이터 Provider 모듈.
//!
//! ## KRX 시장 데이터
//! - `KrxFundamentalsFetcher`: OTP 발급 후 CSV 다운로드 (일자별 전종목 펀더멘털)
//!
//! ## 네이버 금융
//! - `NaverFinanceScraper`: 시가총액 목록, 업종 등락 현황, 업종별 구성 종목

pub mod krx;
pub mod naver;

pub use krx::{KrxConfig, KrxDataset, KrxFundamentalsFetcher, ReferenceInstrument};
pub use naver::{NaverConfig, NaverFinanceScraper, SectorCompanyMap, SectorLink};
