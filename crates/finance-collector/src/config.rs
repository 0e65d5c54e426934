//! 환경변수 기반 설정 모듈.

use crate::error::CollectorError;
use crate::Result;
use finance_data::provider::naver::DEFAULT_MAX_PAGES;
use finance_data::{FixedDelay, KrxConfig, NaverConfig};
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// KRX 펀더멘털 수집 설정
    pub krx: KrxCollectConfig,
    /// 네이버 금융 수집 설정
    pub naver: NaverCollectConfig,
    /// HTTP 타임아웃 (초)
    pub http_timeout_secs: u64,
}

/// KRX 펀더멘털 수집 설정
#[derive(Debug, Clone)]
pub struct KrxCollectConfig {
    /// 날짜 간 대기 시간 (초)
    pub request_interval_secs: u64,
    /// OTP 발급 URL (미설정 시 기본값)
    pub otp_url: Option<String>,
    /// 다운로드 URL (미설정 시 기본값)
    pub download_url: Option<String>,
}

/// 네이버 금융 수집 설정
#[derive(Debug, Clone)]
pub struct NaverCollectConfig {
    /// 시가총액 페이지 간 대기 시간 (초)
    pub request_interval_secs: u64,
    /// 시가총액 최대 페이지 수
    pub max_pages: usize,
    /// 업종 상세 페이지 간 대기 시간 (초)
    pub sector_interval_secs: u64,
    /// 기본 URL (미설정 시 기본값)
    pub base_url: Option<String>,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 구성
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            krx: KrxCollectConfig {
                request_interval_secs: parse_or(&lookup, "KRX_REQUEST_INTERVAL_SECS", 2),
                otp_url: lookup("KRX_OTP_URL"),
                download_url: lookup("KRX_DOWNLOAD_URL"),
            },
            naver: NaverCollectConfig {
                request_interval_secs: parse_or(&lookup, "NAVER_REQUEST_INTERVAL_SECS", 1),
                max_pages: parse_or(&lookup, "NAVER_MAX_PAGES", DEFAULT_MAX_PAGES),
                sector_interval_secs: parse_or(&lookup, "SECTOR_REQUEST_INTERVAL_SECS", 1),
                base_url: lookup("NAVER_BASE_URL"),
            },
            http_timeout_secs: parse_or(&lookup, "HTTP_TIMEOUT_SECS", 30),
        };

        if config.http_timeout_secs == 0 {
            return Err(CollectorError::Config(
                "HTTP_TIMEOUT_SECS는 0보다 커야 합니다".to_string(),
            ));
        }
        if config.naver.max_pages == 0 {
            return Err(CollectorError::Config(
                "NAVER_MAX_PAGES는 0보다 커야 합니다".to_string(),
            ));
        }

        Ok(config)
    }

    /// HTTP 타임아웃을 Duration으로 반환
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// KRX 클라이언트 설정
    pub fn krx_config(&self) -> KrxConfig {
        let mut config = KrxConfig {
            timeout: self.http_timeout(),
            ..KrxConfig::default()
        };
        if let Some(url) = &self.krx.otp_url {
            config.otp_url = url.clone();
        }
        if let Some(url) = &self.krx.download_url {
            config.download_url = url.clone();
        }
        config
    }

    /// 네이버 금융 클라이언트 설정
    pub fn naver_config(&self) -> NaverConfig {
        let mut config = NaverConfig {
            timeout: self.http_timeout(),
            ..NaverConfig::default()
        };
        if let Some(url) = &self.naver.base_url {
            config.base_url = url.clone();
        }
        config
    }
}

impl KrxCollectConfig {
    /// 날짜 간 대기
    pub fn limiter(&self) -> FixedDelay {
        FixedDelay::from_secs(self.request_interval_secs)
    }
}

impl NaverCollectConfig {
    /// 시가총액 페이지 간 대기
    pub fn limiter(&self) -> FixedDelay {
        FixedDelay::from_secs(self.request_interval_secs)
    }

    /// 업종 상세 페이지 간 대기
    pub fn sector_limiter(&self) -> FixedDelay {
        FixedDelay::from_secs(self.sector_interval_secs)
    }
}

/// 값을 파싱 (없거나 실패 시 기본값 사용)
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<CollectorConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CollectorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.krx.request_interval_secs, 2);
        assert_eq!(config.naver.request_interval_secs, 1);
        assert_eq!(config.naver.sector_interval_secs, 1);
        assert_eq!(config.naver.max_pages, 99);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.krx_config().otp_url, KrxConfig::default().otp_url);
        assert_eq!(config.naver_config().base_url, "https://finance.naver.com");
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = config_from(&[
            ("KRX_REQUEST_INTERVAL_SECS", "5"),
            ("NAVER_MAX_PAGES", "abc"),
            ("HTTP_TIMEOUT_SECS", " 10 "),
            ("NAVER_BASE_URL", "http://localhost:8080"),
            ("KRX_DOWNLOAD_URL", "http://localhost:8080/download"),
        ])
        .unwrap();

        assert_eq!(config.krx.limiter().delay(), Duration::from_secs(5));
        assert_eq!(config.naver.max_pages, 99);
        assert_eq!(config.krx_config().timeout, Duration::from_secs(10));
        assert_eq!(
            config.krx_config().download_url,
            "http://localhost:8080/download"
        );
        assert_eq!(config.naver_config().base_url, "http://localhost:8080");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(matches!(
            config_from(&[("HTTP_TIMEOUT_SECS", "0")]),
            Err(CollectorError::Config(_))
        ));
    }
}
