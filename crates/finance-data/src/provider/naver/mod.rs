//! 네이버 금융 크롤러.
//!
//! ## 데이터 소스
//! - `/sise/sise_market_sum.nhn`: 시가총액 목록 (페이지 단위, 표시 항목 선택 가능)
//! - `/sise/sise_group.nhn?type=upjong`: 업종별 등락 현황
//! - `/sise/sise_group_detail.nhn?type=upjong&no=...`: 업종별 구성 종목
//!
//! ## 사용 예시
//! ```rust,ignore
//! let scraper = NaverFinanceScraper::new(NaverConfig::default())?;
//! let table = scraper.scrape_market_sum(&FixedDelay::from_secs(1), DEFAULT_MAX_PAGES).await?;
//! let sectors = scraper.fetch_sector_companies(&FixedDelay::from_secs(1)).await?;
//! ```
//!
//! HTML 문서(`scraper::Html`)는 await 지점을 넘어 보관하지 않습니다.
//! 응답 본문을 받은 뒤 동기 파서 함수에서 바로 필요한 값만 뽑아냅니다.

mod market_sum;
mod sector;

pub use market_sum::{parse_field_ids, parse_market_sum_page, DEFAULT_MAX_PAGES};
pub use sector::{
    parse_sector_company_names, parse_sector_links, parse_sector_performance, SectorCompanyMap,
    SectorLink, SECTOR_PERFORMANCE_COLUMNS,
};

use crate::error::{DataError, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// 네이버 금융 기본 URL.
const NAVER_FINANCE_URL: &str = "https://finance.naver.com";

/// 네이버 금융 설정.
#[derive(Debug, Clone)]
pub struct NaverConfig {
    /// 기본 URL (경로 제외, 예: "https://finance.naver.com")
    pub base_url: String,
    /// 브라우저 User-Agent
    pub user_agent: String,
    /// HTTP 타임아웃
    pub timeout: Duration,
}

impl Default for NaverConfig {
    fn default() -> Self {
        Self {
            base_url: NAVER_FINANCE_URL.to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// 네이버 금융 크롤러
///
/// HTML 파싱을 통해 시가총액 목록과 업종 정보를 수집합니다.
pub struct NaverFinanceScraper {
    client: Client,
    config: NaverConfig,
}

impl NaverFinanceScraper {
    /// 설정으로 생성
    pub fn new(config: NaverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { client, config })
    }

    /// 설정 반환
    pub fn config(&self) -> &NaverConfig {
        &self.config
    }

    /// 기본 URL 뒤에 경로를 붙인 절대 URL
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 페이지 HTML 본문 조회
    async fn get_html(&self, url: &str) -> Result<String> {
        debug!(url = url, "네이버 금융 요청");

        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("Naver Finance".to_string()));
        }

        Ok(response.text().await?)
    }
}
