//! 시장 구조 분석을 위한 도메인 모델.

mod candle;

pub use candle::*;
