//! # SMC Core
//!
//! 시장 구조(market structure) 분석의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 분석 파이프라인 전반에서 사용되는 기본 타입을 제공합니다:
//! - 캔들 및 캔들 시퀀스 (`Candle`, `CandleSeries`)
//! - 가격/거래량 타입 및 스윙 평가 전략 정의
//! - 설정 관리
//! - 로깅 인프라
//! - 에러 분류 (스키마 / 설정)

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
