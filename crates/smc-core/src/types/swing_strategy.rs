//! 스윙 포인트 평가 전략 정의.
//!
//! 전략은 닫힌 집합이며 이름 하나로 선택됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SmcError;

/// 스윙 고점/저점 평가 전략.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingStrategy {
    /// 직전 `swing_length`개 구간의 최고가/최저가와 일치하면 스윙
    #[default]
    Default,
    /// 직전 두 캔들과 직전 구간을 엄격하게 넘어서면 스윙
    Fractals,
    /// 구간 극값이면서 종가 모멘텀 방향이 일치하면 스윙
    Momentum,
    /// 고가/저가의 지수가중이동평균 돌파 여부로 판정
    WeightedRollingWindow,
    /// 단기/장기 두 구간을 함께 평가 (±1 단기, ±2 장기)
    Combined,
}

impl SwingStrategy {
    /// 모든 전략 목록.
    pub const ALL: [SwingStrategy; 5] = [
        SwingStrategy::Default,
        SwingStrategy::Fractals,
        SwingStrategy::Momentum,
        SwingStrategy::WeightedRollingWindow,
        SwingStrategy::Combined,
    ];

    /// 설정 파일에서 사용하는 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwingStrategy::Default => "default",
            SwingStrategy::Fractals => "fractals",
            SwingStrategy::Momentum => "momentum",
            SwingStrategy::WeightedRollingWindow => "weighted_rolling_window",
            SwingStrategy::Combined => "combined",
        }
    }

    /// 단기/장기 두 구간 길이를 사용하는 전략인지 확인합니다.
    pub fn uses_dual_window(&self) -> bool {
        matches!(self, SwingStrategy::Combined)
    }
}

impl fmt::Display for SwingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwingStrategy {
    type Err = SmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| SmcError::UnknownStrategy(s.to_string()))
    }
}
