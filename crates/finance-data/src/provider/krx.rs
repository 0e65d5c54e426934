//! KRX 시장 데이터 OTP 다운로드.
//!
//! KRX 파일 다운로드는 두 단계로 이루어집니다.
//! 1. OTP 발급 엔드포인트에 날짜와 데이터셋 식별자를 GET → 응답 본문 자체가 일회용 OTP
//! 2. 다운로드 엔드포인트에 `code=<OTP>` 폼으로 POST → CSV 바이트
//!
//! OTP는 (날짜, 데이터셋) 한 쌍에 대해 한 번만 쓰이며 저장하거나 재사용하지 않습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use finance_data::provider::krx::{KrxConfig, KrxFundamentalsFetcher};
//!
//! let fetcher = KrxFundamentalsFetcher::new(KrxConfig::default())?;
//! let table = fetcher.fetch_fundamentals(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()).await?;
//! ```

use crate::collect::FundamentalsSource;
use crate::error::{DataError, Result};
use crate::frame;
use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// 기본 브라우저 User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

/// KRX OTP 발급 URL.
const KRX_OTP_URL: &str = "http://marketdata.krx.co.kr/contents/COM/GenerateOTP.jspx";

/// KRX 파일 다운로드 URL.
const KRX_DOWNLOAD_URL: &str = "http://file.krx.co.kr/download.jspx";

/// 다운로드 요청 Referer.
const KRX_REFERER: &str = "http://marketdata.krx.co.kr/mdi";

/// 다운로드할 KRX 데이터셋 식별자.
///
/// 기본값은 "전종목 PER/PBR/배당수익률" 화면(13020401)의 CSV 내려받기입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KrxDataset {
    /// 요청 이름 (`name`)
    pub name: String,
    /// 파일 형식 (`filetype`)
    pub filetype: String,
    /// 화면 데이터 경로 (`url`)
    pub url: String,
    /// 화면 JSP 경로 (`pagePath`)
    pub page_path: String,
    /// 시장 구분 (`market_gubun`, ALL/STK/KSQ)
    pub market_gubun: String,
    /// 조회 구분 (`gubun`)
    pub gubun: String,
}

impl Default for KrxDataset {
    fn default() -> Self {
        Self {
            name: "fileDown".to_string(),
            filetype: "csv".to_string(),
            url: "MKD/13/1302/13020401/mkd13020401".to_string(),
            page_path: "/contents/MKD/13/1302/13020401/MKD13020401.jsp".to_string(),
            market_gubun: "ALL".to_string(),
            gubun: "1".to_string(),
        }
    }
}

/// OTP 요청의 필수 종목 파라미터를 채우기 위한 기준 종목.
///
/// 엔드포인트가 종목 파라미터를 요구할 뿐, 받아오는 데이터는 시장 전체입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInstrument {
    /// 단축코드 (예: "A005930")
    pub short_code: String,
    /// 표준코드 (ISIN, 예: "KR7005930003")
    pub standard_code: String,
    /// 종목명
    pub name: String,
}

impl ReferenceInstrument {
    /// `isu_cdnm` 값 ("A005930/삼성전자")
    pub fn code_and_name(&self) -> String {
        format!("{}/{}", self.short_code, self.name)
    }
}

impl Default for ReferenceInstrument {
    fn default() -> Self {
        Self {
            short_code: "A005930".to_string(),
            standard_code: "KR7005930003".to_string(),
            name: "삼성전자".to_string(),
        }
    }
}

/// KRX 다운로드 설정.
#[derive(Debug, Clone)]
pub struct KrxConfig {
    /// OTP 발급 URL
    pub otp_url: String,
    /// 파일 다운로드 URL
    pub download_url: String,
    /// 다운로드 요청 Referer
    pub referer: String,
    /// 브라우저 User-Agent
    pub user_agent: String,
    /// HTTP 타임아웃
    pub timeout: Duration,
    /// 데이터셋 식별자
    pub dataset: KrxDataset,
    /// 기준 종목
    pub reference: ReferenceInstrument,
}

impl Default for KrxConfig {
    fn default() -> Self {
        Self {
            otp_url: KRX_OTP_URL.to_string(),
            download_url: KRX_DOWNLOAD_URL.to_string(),
            referer: KRX_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            dataset: KrxDataset::default(),
            reference: ReferenceInstrument::default(),
        }
    }
}

/// KRX 일회용 다운로드 OTP.
///
/// 다운로드 요청에 값으로 넘겨져 소비됩니다.
#[derive(Debug)]
pub struct KrxTicket(String);

impl KrxTicket {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// KRX 전종목 펀더멘털 다운로드.
pub struct KrxFundamentalsFetcher {
    client: Client,
    config: KrxConfig,
}

impl KrxFundamentalsFetcher {
    /// 설정으로 생성
    ///
    /// 커넥션 풀을 쓰지 않으므로 모든 요청은 독립된 연결로 나갑니다.
    pub fn new(config: KrxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| DataError::Config(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { client, config })
    }

    /// 설정 반환
    pub fn config(&self) -> &KrxConfig {
        &self.config
    }

    /// OTP 요청 쿼리 파라미터
    pub fn ticket_params(&self, date: NaiveDate) -> Vec<(&'static str, String)> {
        let dataset = &self.config.dataset;
        let reference = &self.config.reference;

        vec![
            ("name", dataset.name.clone()),
            ("filetype", dataset.filetype.clone()),
            ("url", dataset.url.clone()),
            ("market_gubun", dataset.market_gubun.clone()),
            ("gubun", dataset.gubun.clone()),
            ("isu_cdnm", reference.code_and_name()),
            ("isu_cd", reference.standard_code.clone()),
            ("isu_nm", reference.name.clone()),
            ("isu_srt_cd", reference.short_code.clone()),
            ("schdate", date.format("%Y%m%d").to_string()),
            ("pagePath", dataset.page_path.clone()),
        ]
    }

    /// 해당 날짜의 다운로드 OTP 발급
    pub async fn request_ticket(&self, date: NaiveDate) -> Result<KrxTicket> {
        debug!(date = %date, "KRX OTP 요청");

        let response = self
            .client
            .get(&self.config.otp_url)
            .query(&self.ticket_params(date))
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("KRX".to_string()));
        }

        let ticket = response.text().await?;
        Ok(KrxTicket(ticket.trim().to_string()))
    }

    /// OTP로 CSV 다운로드
    pub async fn download(&self, ticket: KrxTicket) -> Result<DataFrame> {
        let response = self
            .client
            .post(&self.config.download_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(REFERER, &self.config.referer)
            .form(&[("code", ticket.0)])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("KRX".to_string()));
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "KRX CSV 다운로드");
        frame::read_csv(bytes.to_vec())
    }

    /// 특정 날짜의 전종목 펀더멘털 조회 (OTP 발급 → 다운로드)
    ///
    /// 휴장일은 헤더만 있는 빈 테이블이 반환됩니다.
    pub async fn fetch_fundamentals(&self, date: NaiveDate) -> Result<DataFrame> {
        let ticket = self.request_ticket(date).await?;
        let table = self.download(ticket).await?;
        debug!(date = %date, rows = table.height(), "KRX 펀더멘털 조회 완료");
        Ok(table)
    }
}

#[async_trait]
impl FundamentalsSource for KrxFundamentalsFetcher {
    async fn fetch(&self, date: NaiveDate) -> Result<DataFrame> {
        self.fetch_fundamentals(date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_params_use_compact_date_and_reference() {
        let fetcher = KrxFundamentalsFetcher::new(KrxConfig::default()).unwrap();
        let params = fetcher.ticket_params(NaiveDate::from_ymd_opt(2019, 3, 8).unwrap());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("schdate"), Some("20190308"));
        assert_eq!(get("isu_cdnm"), Some("A005930/삼성전자"));
        assert_eq!(get("isu_cd"), Some("KR7005930003"));
        assert_eq!(get("market_gubun"), Some("ALL"));
        assert_eq!(get("url"), Some("MKD/13/1302/13020401/mkd13020401"));
        assert_eq!(params.len(), 11);
    }

    #[test]
    fn test_reference_instrument_code_and_name() {
        let reference = ReferenceInstrument {
            short_code: "A000660".to_string(),
            standard_code: "KR7000660001".to_string(),
            name: "SK하이닉스".to_string(),
        };

        assert_eq!(reference.code_and_name(), "A000660/SK하이닉스");
    }

    #[tokio::test]
    #[ignore] // 실제 네트워크 테스트는 ignore
    async fn test_fetch_live() {
        let fetcher = KrxFundamentalsFetcher::new(KrxConfig::default()).unwrap();
        let result = fetcher
            .fetch_fundamentals(NaiveDate::from_ymd_opt(2019, 3, 8).unwrap())
            .await;

        match result {
            Ok(df) => println!("KRX 펀더멘털: {} rows", df.height()),
            Err(e) => eprintln!("오류: {}", e),
        }
    }
}
