//! 데이터 수집 모듈.

pub mod krx_collect;
pub mod naver_collect;
pub mod output;
pub mod progress;

pub use krx_collect::{collect_krx_fundamentals, KrxCollection};
pub use naver_collect::{collect_market_sum, collect_sector_companies, collect_sector_performance};
pub use output::{write_csv, write_json};
