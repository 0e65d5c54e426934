//! 요청 간 대기 전략.
//!
//! 모든 수집 루프는 요청 사이에 [`RateLimiter::wait`]를 호출합니다.
//! 기본 구현은 고정 딜레이([`FixedDelay`])이며, 응답 시간이나 크기와 무관하게
//! 항상 같은 시간만큼 대기합니다.

use async_trait::async_trait;
use std::time::Duration;

/// 요청 간 대기 전략.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// 다음 요청 전까지 대기
    async fn wait(&self);
}

/// 고정 딜레이 대기.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// 지정한 딜레이로 생성
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// 초 단위 딜레이로 생성
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// 대기 없음 (테스트, 로컬 미러용)
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// 딜레이 반환
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
