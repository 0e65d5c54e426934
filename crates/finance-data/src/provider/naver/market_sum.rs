//! 시가총액 목록 페이지 수집.
//!
//! 표시 항목(fieldIds)은 페이지마다 체크박스 페이지에서 다시 읽어옵니다.
//! 매 페이지 요청이 하나 더 늘어나지만, 수집 도중 항목 구성이 바뀌어도 따라갑니다.

use super::NaverFinanceScraper;
use crate::error::{DataError, Result};
use crate::frame;
use crate::html::{self, TableLocator};
use crate::rate_limit::RateLimiter;
use polars::prelude::DataFrame;
use scraper::Html;
use tracing::{debug, info};

/// 최대 페이지 수 기본값 (빈 페이지 신호가 오지 않을 때의 상한)
pub const DEFAULT_MAX_PAGES: usize = 99;

/// 시가총액 목록 페이지
const MARKET_SUM_PATH: &str = "/sise/sise_market_sum.nhn";

/// 표시 항목 변경 제출 페이지 (returnUrl로 리다이렉트)
const FIELD_SUBMIT_PATH: &str = "/sise/field_submit.nhn";

/// 표시 항목 체크박스
const FIELD_CHECKBOX_SELECTOR: &str = ".subcnt_sise_item_top table input";

/// 시가총액 데이터 테이블 (페이지의 두 번째 테이블)
const MARKET_SUM_TABLE: TableLocator = TableLocator(1);

/// 순위 열. 값이 없는 행은 구분선/요약 행
const RANK_COLUMN: &str = "N";

impl NaverFinanceScraper {
    /// 현재 선택 가능한 표시 항목 ID 조회
    pub async fn fetch_field_ids(&self) -> Result<Vec<String>> {
        let body = self.get_html(&self.url(MARKET_SUM_PATH)).await?;
        parse_field_ids(&body)
    }

    /// 페이지 번호와 표시 항목으로 목록 URL 생성
    pub fn market_sum_page_url(&self, page: usize, field_ids: &[String]) -> String {
        let mut url = format!(
            "{}?menu=market_sum&returnUrl={}?page={}",
            self.url(FIELD_SUBMIT_PATH),
            self.url(MARKET_SUM_PATH),
            page
        );
        for id in field_ids {
            url.push_str("&fieldIds=");
            url.push_str(id);
        }
        url
    }

    /// 목록 한 페이지 조회 (순위 없는 행 제거 후)
    pub async fn fetch_market_sum_page(
        &self,
        page: usize,
        field_ids: &[String],
    ) -> Result<DataFrame> {
        let url = self.market_sum_page_url(page, field_ids);
        let body = self.get_html(&url).await?;
        parse_market_sum_page(&body)
    }

    /// 시가총액 목록 전체 수집.
    ///
    /// 1페이지부터 순서대로 요청하며, 행이 없는 페이지를 만나면 멈춥니다.
    /// `max_pages`는 빈 페이지가 끝내 오지 않을 때를 위한 상한입니다.
    pub async fn scrape_market_sum(
        &self,
        limiter: &dyn RateLimiter,
        max_pages: usize,
    ) -> Result<DataFrame> {
        self.scrape_market_sum_with_progress(limiter, max_pages, |_, _| {})
            .await
    }

    /// 진행 상황 콜백과 함께 시가총액 목록 수집
    ///
    /// # Arguments
    /// * `progress_callback` - 데이터가 있는 페이지마다 (수집한 페이지 수, `max_pages`)
    pub async fn scrape_market_sum_with_progress<F>(
        &self,
        limiter: &dyn RateLimiter,
        max_pages: usize,
        mut progress_callback: F,
    ) -> Result<DataFrame>
    where
        F: FnMut(usize, usize),
    {
        let mut pages = Vec::new();

        for page in 1..=max_pages {
            let field_ids = self.fetch_field_ids().await?;
            let table = self.fetch_market_sum_page(page, &field_ids).await?;

            if table.height() == 0 {
                debug!(page, "빈 페이지, 수집 종료");
                break;
            }

            debug!(page, rows = table.height(), fields = field_ids.len(), "시가총액 페이지 수집");
            pages.push(table);
            progress_callback(pages.len(), max_pages);
            limiter.wait().await;
        }

        let page_count = pages.len();
        let combined = frame::concat(pages)?;
        info!(pages = page_count, rows = combined.height(), "시가총액 목록 수집 완료");
        Ok(combined)
    }
}

/// 체크박스 페이지에서 표시 항목 ID 추출
pub fn parse_field_ids(body: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(body);
    let selector = html::selector(FIELD_CHECKBOX_SELECTOR)?;

    document
        .select(&selector)
        .map(|input| {
            input
                .value()
                .attr("value")
                .map(str::to_string)
                .ok_or_else(|| DataError::Parse("표시 항목 체크박스에 value 속성이 없음".to_string()))
        })
        .collect()
}

/// 목록 페이지에서 데이터 테이블 추출 (순위 없는 행 제거)
pub fn parse_market_sum_page(body: &str) -> Result<DataFrame> {
    let document = Html::parse_document(body);
    let table = html::locate_table(&document, MARKET_SUM_TABLE)?;
    let df = frame::from_html_table(&table)?;
    frame::drop_null_rows(&df, RANK_COLUMN)
}
