//! 업종(섹터) 등락 현황 및 업종별 구성 종목 수집.

use super::NaverFinanceScraper;
use crate::error::{DataError, Result};
use crate::frame;
use crate::html::{self, TableLocator};
use crate::rate_limit::RateLimiter;
use polars::prelude::DataFrame;
use reqwest::Url;
use scraper::Html;
use serde::ser::{Serialize, Serializer};
use tracing::{debug, info};

/// 업종별 시세 페이지
const SECTOR_GROUP_PATH: &str = "/sise/sise_group.nhn?type=upjong";

/// 업종 상세 링크
const SECTOR_LINK_SELECTOR: &str = "#contentarea_left td a";

/// 업종 등락 현황 테이블 (첫 번째 테이블)
const SECTOR_TABLE: TableLocator = TableLocator(0);

/// 업종 구성 종목 테이블 (세 번째 테이블)
const SECTOR_COMPANY_TABLE: TableLocator = TableLocator(2);

/// 종목명 열
const COMPANY_NAME_COLUMN: &str = "종목명";

/// 업종 등락 현황 열 이름 (원격 헤더 대신 고정 적용)
pub const SECTOR_PERFORMANCE_COLUMNS: [&str; 7] = [
    "업종명",
    "전일대비",
    "전일대비 등락현황 전체",
    "전일대비 등락현황 상승",
    "전일대비 등락현황 보합",
    "전일대비 등락현황 하락",
    "등락그래프",
];

/// 업종 상세 페이지 링크
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorLink {
    /// 화면에 표시된 업종명
    pub label: String,
    /// 링크 주소 (보통 상대 경로)
    pub href: String,
}

/// 업종명 → 구성 종목명 목록.
///
/// 처음 등장한 순서를 유지합니다. 같은 업종명을 다시 넣으면
/// 위치는 그대로 두고 종목 목록만 교체합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorCompanyMap {
    entries: Vec<(String, Vec<String>)>,
}

impl SectorCompanyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 업종 추가 (기존 업종이면 이전 목록 반환)
    pub fn insert(&mut self, label: String, companies: Vec<String>) -> Option<Vec<String>> {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => Some(std::mem::replace(existing, companies)),
            None => {
                self.entries.push((label, companies));
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, companies)| companies.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 업종명 목록 (삽입 순서)
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(l, companies)| (l.as_str(), companies.as_slice()))
    }

    /// 전체 종목 수
    pub fn company_count(&self) -> usize {
        self.entries.iter().map(|(_, c)| c.len()).sum()
    }
}

impl Serialize for SectorCompanyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl NaverFinanceScraper {
    /// 업종별 등락 현황 조회
    pub async fn fetch_sector_performance(&self) -> Result<DataFrame> {
        let body = self.get_html(&self.url(SECTOR_GROUP_PATH)).await?;
        let table = parse_sector_performance(&body)?;
        info!(sectors = table.height(), "업종 등락 현황 조회 완료");
        Ok(table)
    }

    /// 업종 상세 링크 목록 조회
    pub async fn fetch_sector_links(&self) -> Result<Vec<SectorLink>> {
        let body = self.get_html(&self.url(SECTOR_GROUP_PATH)).await?;
        parse_sector_links(&body)
    }

    /// 링크를 기본 URL 기준 절대 URL로 변환
    pub fn sector_url(&self, link: &SectorLink) -> Result<Url> {
        Url::parse(&self.config.base_url)
            .and_then(|base| base.join(&link.href))
            .map_err(|e| DataError::Parse(format!("업종 링크 URL 오류 ({}): {}", link.href, e)))
    }

    /// 업종 상세 페이지의 구성 종목명 조회
    pub async fn fetch_sector_company_names(&self, link: &SectorLink) -> Result<Vec<String>> {
        let url = self.sector_url(link)?;
        let body = self.get_html(url.as_str()).await?;
        parse_sector_company_names(&body)
    }

    /// 업종별 구성 종목 전체 수집
    pub async fn fetch_sector_companies(
        &self,
        limiter: &dyn RateLimiter,
    ) -> Result<SectorCompanyMap> {
        self.fetch_sector_companies_with_progress(limiter, |_, _| {})
            .await
    }

    /// 진행 상황 콜백과 함께 업종별 구성 종목 수집
    ///
    /// 링크는 인덱스 페이지에 나온 순서대로 하나씩 요청하며,
    /// 업종 하나를 처리할 때마다 `limiter.wait()`를 호출합니다.
    ///
    /// # Arguments
    /// * `progress_callback` - 진행 상황 콜백 (처리 수, 전체 수)
    pub async fn fetch_sector_companies_with_progress<F>(
        &self,
        limiter: &dyn RateLimiter,
        mut progress_callback: F,
    ) -> Result<SectorCompanyMap>
    where
        F: FnMut(usize, usize),
    {
        let links = self.fetch_sector_links().await?;
        let total = links.len();
        let mut sectors = SectorCompanyMap::new();

        for (i, link) in links.into_iter().enumerate() {
            let companies = self.fetch_sector_company_names(&link).await?;
            debug!(sector = %link.label, companies = companies.len(), "업종 구성 종목 수집");

            if sectors.insert(link.label.clone(), companies).is_some() {
                debug!(sector = %link.label, "중복 업종명, 이전 목록 교체");
            }

            progress_callback(i + 1, total);
            limiter.wait().await;
        }

        info!(
            sectors = sectors.len(),
            companies = sectors.company_count(),
            "업종별 구성 종목 수집 완료"
        );
        Ok(sectors)
    }
}

/// 업종 등락 현황 테이블 추출 (고정 7열)
pub fn parse_sector_performance(body: &str) -> Result<DataFrame> {
    let document = Html::parse_document(body);
    let table = html::locate_table(&document, SECTOR_TABLE)?.relabel(&SECTOR_PERFORMANCE_COLUMNS);
    frame::from_html_table(&table)
}

/// 업종 인덱스 페이지에서 상세 링크 추출
pub fn parse_sector_links(body: &str) -> Result<Vec<SectorLink>> {
    let document = Html::parse_document(body);
    let selector = html::selector(SECTOR_LINK_SELECTOR)?;

    document
        .select(&selector)
        .map(|a| {
            let href = a
                .value()
                .attr("href")
                .ok_or_else(|| DataError::Parse("업종 링크에 href 속성이 없음".to_string()))?;
            Ok(SectorLink {
                label: a.text().collect::<String>().trim().to_string(),
                href: href.to_string(),
            })
        })
        .collect()
}

/// 업종 상세 페이지에서 종목명 목록 추출
pub fn parse_sector_company_names(body: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(body);
    let table = html::locate_table(&document, SECTOR_COMPANY_TABLE)?;
    let df = frame::from_html_table(&table)?;
    let df = frame::drop_null_rows(&df, COMPANY_NAME_COLUMN)?;
    frame::column_values(&df, COMPANY_NAME_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::naver::NaverConfig;

    #[test]
    fn test_sector_map_keeps_first_position_on_overwrite() {
        let mut map = SectorCompanyMap::new();
        map.insert("반도체".to_string(), vec!["삼성전자".to_string()]);
        map.insert("은행".to_string(), vec!["KB금융".to_string()]);

        let previous = map.insert("반도체".to_string(), vec!["SK하이닉스".to_string()]);

        assert_eq!(previous, Some(vec!["삼성전자".to_string()]));
        assert_eq!(map.len(), 2);
        assert_eq!(map.labels().collect::<Vec<_>>(), vec!["반도체", "은행"]);
        assert_eq!(map.get("반도체"), Some(&["SK하이닉스".to_string()][..]));
    }

    #[test]
    fn test_sector_map_serializes_in_insertion_order() {
        let mut map = SectorCompanyMap::new();
        map.insert("은행".to_string(), vec!["KB금융".to_string()]);
        map.insert("반도체".to_string(), vec![]);

        let json = serde_json::to_string(&map).unwrap();

        assert_eq!(json, r#"{"은행":["KB금융"],"반도체":[]}"#);
    }

    #[test]
    fn test_parse_sector_performance_always_seven_columns() {
        let body = r#"
            <table class="type_1">
              <tr><th rowspan="2">업종명</th><th rowspan="2">전일대비</th><th colspan="4">전일대비 등락현황</th><th rowspan="2">등락그래프</th></tr>
              <tr><th>전체</th><th>상승</th><th>보합</th><th>하락</th></tr>
              <tr><td colspan="7" class="blank_08"></td></tr>
              <tr><td><a href="/sise/sise_group_detail.nhn?type=upjong&no=278">반도체</a></td><td>+1.20%</td><td>30</td><td>20</td><td>2</td><td>8</td><td></td></tr>
              <tr><td><a href="/sise/sise_group_detail.nhn?type=upjong&no=261">은행</a></td><td>-0.50%</td><td>10</td></tr>
            </table>
        "#;

        let df = parse_sector_performance(body).unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, SECTOR_PERFORMANCE_COLUMNS.to_vec());
        assert_eq!(df.height(), 2);
        assert_eq!(frame::column_values(&df, "업종명").unwrap(), vec!["반도체", "은행"]);
    }

    #[test]
    fn test_parse_sector_links() {
        let body = r#"
            <div id="contentarea_left">
              <table>
                <tr><td><a href="/sise/sise_group_detail.nhn?type=upjong&no=278"> 반도체 </a></td></tr>
                <tr><td><a href="/sise/sise_group_detail.nhn?type=upjong&no=261">은행</a></td></tr>
              </table>
            </div>
            <div id="footer"><table><tr><td><a href="/other">기타</a></td></tr></table></div>
        "#;

        let links = parse_sector_links(body).unwrap();

        assert_eq!(
            links,
            vec![
                SectorLink {
                    label: "반도체".to_string(),
                    href: "/sise/sise_group_detail.nhn?type=upjong&no=278".to_string(),
                },
                SectorLink {
                    label: "은행".to_string(),
                    href: "/sise/sise_group_detail.nhn?type=upjong&no=261".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_sector_url_resolves_relative_href() {
        let scraper = NaverFinanceScraper::new(NaverConfig::default()).unwrap();
        let link = SectorLink {
            label: "반도체".to_string(),
            href: "/sise/sise_group_detail.nhn?type=upjong&no=278".to_string(),
        };

        assert_eq!(
            scraper.sector_url(&link).unwrap().as_str(),
            "https://finance.naver.com/sise/sise_group_detail.nhn?type=upjong&no=278"
        );
    }

    #[test]
    fn test_parse_sector_company_names() {
        let body = r#"
            <table><tr><td>업종 요약</td></tr></table>
            <table><tr><td>등락률</td><td>+1.20%</td></tr></table>
            <table class="type_5">
              <thead><tr><th>종목명</th><th>현재가</th></tr></thead>
              <tbody>
                <tr><td><a href="/item/main.nhn?code=005930">삼성전자</a></td><td>56,000</td></tr>
                <tr><td></td><td>-</td></tr>
                <tr><td><a href="/item/main.nhn?code=000660">SK하이닉스</a></td><td>98,000</td></tr>
              </tbody>
            </table>
        "#;

        assert_eq!(
            parse_sector_company_names(body).unwrap(),
            vec!["삼성전자", "SK하이닉스"]
        );
    }
}
