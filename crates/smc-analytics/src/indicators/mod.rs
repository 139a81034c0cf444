//! 시장 구조 지표 모듈.
//!
//! 이 모듈은 캔들 시퀀스에서 시장 구조 패턴을 인과적으로(lookahead 없이) 감지합니다.
//!
//! # 지원 지표
//!
//! ## 스윙 포인트 (Swing Highs/Lows)
//! - **default / fractals / momentum / weighted_rolling_window / combined**: 교체 가능한 평가 전략
//!
//! ## 구조 돌파 (Market Structure Breaks)
//! - **BOS**: 추세 방향과 일치하는 구조 돌파 (Break of Structure)
//! - **CHoCH**: 추세 전환을 나타내는 구조 돌파 (Change of Character)
//!
//! ## 오더블록 (Order Blocks)
//! - 결정적인 돌파 직전 캔들 구간의 가격 범위와 무효화(mitigation) 시점
//!
//! ## 유동성 존 (Liquidity Zones)
//! - 인접한 같은 방향 스윙 레벨 클러스터와 스윕(sweep) 시점
//!
//! # 사용 예시
//!
//! ```ignore
//! use smc_analytics::indicators::{SwingDetector, SwingParams, MarketStructureDetector, StructureParams};
//!
//! let swings = SwingDetector::new().detect(&candles, SwingParams::default())?;
//! let breaks = MarketStructureDetector::new().detect(&candles, &swings, StructureParams::default())?;
//! ```

pub mod liquidity;
pub mod order_block;
pub mod structure;
pub mod swing;

use serde::{Deserialize, Serialize};
use smc_core::{CandleSeries, SmcError};
use thiserror::Error;

pub use liquidity::{LiquidityDetector, LiquidityParams, LiquiditySeries, LiquidityZone};
pub use order_block::{OrderBlock, OrderBlockDetector, OrderBlockParams, OrderBlockSeries};
pub use structure::{
    BreakKind, MarketStructureDetector, StructuralBreak, StructureParams, StructureSeries,
};
pub use swing::{SwingDetector, SwingLabel, SwingParams, SwingPoint, SwingSeries};

/// 지표 계산 오류.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 알 수 없는 스윙 평가 전략
    #[error("알 수 없는 스윙 전략: {0}")]
    UnknownStrategy(String),

    /// 입력 스키마 오류
    #[error("입력 스키마 오류: {0}")]
    Schema(String),

    /// 스윙 시리즈와 캔들 시퀀스 길이 불일치
    #[error("스윙 시리즈 길이 불일치: 캔들 {candles}개, 스윙 {swings}개")]
    LengthMismatch { candles: usize, swings: usize },

    /// 직렬화 오류
    #[error("직렬화 오류: {0}")]
    Serialization(String),
}

impl IndicatorError {
    /// 설정 오류인지 확인합니다.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            IndicatorError::InvalidParameter(_) | IndicatorError::UnknownStrategy(_)
        )
    }

    /// 입력 스키마 오류인지 확인합니다.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            IndicatorError::Schema(_) | IndicatorError::LengthMismatch { .. }
        )
    }
}

impl From<SmcError> for IndicatorError {
    fn from(err: SmcError) -> Self {
        match err {
            SmcError::UnknownStrategy(name) => IndicatorError::UnknownStrategy(name),
            SmcError::Serialization(msg) => IndicatorError::Serialization(msg),
            e if e.is_schema_error() => IndicatorError::Schema(e.to_string()),
            e => IndicatorError::InvalidParameter(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for IndicatorError {
    fn from(err: serde_json::Error) -> Self {
        IndicatorError::Serialization(err.to_string())
    }
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 이벤트 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// 강세 (+1)
    Bullish,
    /// 약세 (-1)
    Bearish,
}

impl Direction {
    /// 부호 있는 신호값 (+1 / -1).
    pub fn signal(self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
        }
    }
}

/// 하위 감지기 입력 정렬 검증.
///
/// 스윙 시리즈는 캔들 위치와 1:1로 정렬되어야 합니다.
pub(crate) fn ensure_aligned(candles: &CandleSeries, swings: &SwingSeries) -> IndicatorResult<()> {
    if candles.len() != swings.len() {
        return Err(IndicatorError::LengthMismatch {
            candles: candles.len(),
            swings: swings.len(),
        });
    }
    Ok(())
}
