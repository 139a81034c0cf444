//! 시장 구조(Smart Money Concepts) 분석 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 스윙 고점/저점 감지 (5가지 평가 전략)
//! - 구조 돌파 감지 (BOS / CHoCH)
//! - 오더블록 감지 및 무효화 추적
//! - 유동성 존 클러스터링 및 스윕 감지
//!
//! # Re-exports
//!
//! - [`indicators`]: 개별 감지기와 결과 테이블
//! - [`engine`]: 설정 기반 통합 엔진 (`SmcEngine`)

pub mod engine;
pub mod indicators;

pub use engine::{SmcAnalysis, SmcEngine};

// Indicators 모듈 re-exports
pub use indicators::{
    BreakKind,
    Direction,
    IndicatorError,
    IndicatorResult,
    // 유동성 존
    LiquidityDetector,
    LiquidityParams,
    LiquiditySeries,
    LiquidityZone,
    // 구조 돌파
    MarketStructureDetector,
    // 오더블록
    OrderBlock,
    OrderBlockDetector,
    OrderBlockParams,
    OrderBlockSeries,
    StructuralBreak,
    StructureParams,
    StructureSeries,
    // 스윙 포인트
    SwingDetector,
    SwingLabel,
    SwingParams,
    SwingPoint,
    SwingSeries,
};
