//! 시간 소스 추상화.
//!
//! 토큰 만료, 시도 횟수 윈도우, 인메모리 Provider의 토큰 수명은 모두
//! 이 trait을 통해 현재 시각을 얻습니다. 테스트에서는 [`ManualClock`]으로
//! 시간을 직접 진행시킬 수 있습니다.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

/// 현재 시각 제공자.
pub trait Clock: Send + Sync {
    /// 현재 UTC 시각.
    fn now(&self) -> DateTime<Utc>;
}

/// 공유 가능한 시계 핸들.
pub type SharedClock = Arc<dyn Clock>;

/// 시스템 시계.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// 공유 핸들로 생성.
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 수동으로 진행시키는 시계.
///
/// 클론은 같은 시각을 공유하므로, 여러 컴포넌트에 주입한 뒤
/// 한 곳에서 [`advance`](ManualClock::advance)하면 모두에 반영됩니다.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// 지정 시각에서 시작하는 시계 생성.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// 현재 시스템 시각에서 시작.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// 시간 진행.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// 시각 직접 설정.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = at;
    }

    /// 공유 핸들로 변환.
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
