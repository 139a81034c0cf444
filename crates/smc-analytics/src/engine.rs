//! 통합 분석 엔진.
//!
//! 설정(`SmcConfig`)을 한 번 검증해 두고, 네 감지기를 같은 설정으로 실행합니다.
//!
//! ```ignore
//! use smc_analytics::SmcEngine;
//! use smc_core::SmcConfig;
//!
//! let engine = SmcEngine::new(SmcConfig::load("config/default.toml")?)?;
//! let candles = engine.load_series(&columns)?;
//! let analysis = engine.analyze(&candles)?;
//! println!("{}", analysis.to_json()?);
//! ```

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_core::{CandleSeries, SmcConfig};
use tracing::info;

use crate::indicators::{
    IndicatorResult, LiquidityDetector, LiquidityParams, LiquiditySeries,
    MarketStructureDetector, OrderBlockDetector, OrderBlockParams, OrderBlockSeries,
    StructureParams, StructureSeries, SwingDetector, SwingParams, SwingSeries,
};

/// 전체 분석 결과 묶음.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmcAnalysis {
    /// 스윙 고점/저점
    pub swings: SwingSeries,
    /// BOS/CHoCH
    pub structure: StructureSeries,
    /// 오더블록
    pub order_blocks: OrderBlockSeries,
    /// 유동성 존
    pub liquidity: LiquiditySeries,
}

impl SmcAnalysis {
    /// JSON 문자열로 직렬화합니다. 없는 값은 `null`입니다.
    pub fn to_json(&self) -> IndicatorResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 시장 구조 분석 엔진.
#[derive(Debug)]
pub struct SmcEngine {
    config: SmcConfig,
    swing: SwingDetector,
    structure: MarketStructureDetector,
    order_block: OrderBlockDetector,
    liquidity: LiquidityDetector,
}

impl Default for SmcEngine {
    fn default() -> Self {
        Self {
            config: SmcConfig::default(),
            swing: SwingDetector::new(),
            structure: MarketStructureDetector::new(),
            order_block: OrderBlockDetector::new(),
            liquidity: LiquidityDetector::new(),
        }
    }
}

impl SmcEngine {
    /// 설정을 검증하고 엔진을 생성합니다.
    pub fn new(config: SmcConfig) -> IndicatorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// 기본 설정으로 엔진을 생성합니다.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// 설정 파일(+ `SMC__` 환경 변수)로 엔진을 생성합니다.
    pub fn from_path<P: AsRef<Path>>(path: P) -> IndicatorResult<Self> {
        Self::new(SmcConfig::load(path)?)
    }

    /// 현재 설정.
    pub fn config(&self) -> &SmcConfig {
        &self.config
    }

    /// 설정의 `[logging]` 섹션으로 전역 로깅을 초기화합니다. 프로세스당 한 번만 성공합니다.
    pub fn init_logging(&self) -> IndicatorResult<()> {
        Ok(smc_core::init_logging(&self.config.logging)?)
    }

    /// 이름 있는 컬럼 묶음을 설정된 종가 컬럼으로 캔들 시퀀스로 변환합니다.
    pub fn load_series(
        &self,
        columns: &HashMap<String, Vec<Decimal>>,
    ) -> IndicatorResult<CandleSeries> {
        Ok(CandleSeries::from_columns(
            columns,
            &self.config.input.close_column,
        )?)
    }

    // ==================== 개별 감지기 ====================

    /// 스윙 고점/저점.
    pub fn swing_highs_lows(&self, candles: &CandleSeries) -> IndicatorResult<SwingSeries> {
        self.swing
            .detect(candles, SwingParams::from(&self.config.swing))
    }

    /// BOS/CHoCH.
    pub fn bos_choch(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
    ) -> IndicatorResult<StructureSeries> {
        self.structure
            .detect(candles, swings, StructureParams::from(&self.config.structure))
    }

    /// 오더블록.
    pub fn order_blocks(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
    ) -> IndicatorResult<OrderBlockSeries> {
        self.order_block
            .detect(candles, swings, OrderBlockParams::from(&self.config.order_block))
    }

    /// 유동성 존.
    pub fn liquidity(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
    ) -> IndicatorResult<LiquiditySeries> {
        self.liquidity
            .detect(candles, swings, LiquidityParams::from(&self.config.liquidity))
    }

    // ==================== 통합 실행 ====================

    /// 스윙을 계산한 뒤 세 하위 감지기를 모두 실행합니다.
    pub fn analyze(&self, candles: &CandleSeries) -> IndicatorResult<SmcAnalysis> {
        let span = smc_core::analysis_span!("smc_analyze", candles.len(), self.config.swing.strategy);
        let _guard = span.enter();

        let swings = self.swing_highs_lows(candles)?;
        let structure = self.bos_choch(candles, &swings)?;
        let order_blocks = self.order_blocks(candles, &swings)?;
        let liquidity = self.liquidity(candles, &swings)?;

        info!(
            swings = swings.events().count(),
            breaks = structure.events().count(),
            order_blocks = order_blocks.events().count(),
            liquidity_zones = liquidity.events().count(),
            "analysis complete"
        );

        Ok(SmcAnalysis {
            swings,
            structure,
            order_blocks,
            liquidity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use smc_core::{Candle, SwingStrategy};

    fn zigzag(len: usize) -> CandleSeries {
        (0..len)
            .map(|i| {
                let swing = if i % 4 < 2 { dec!(100) } else { dec!(104) };
                let base = swing + Decimal::from(i);
                Candle::new(base, base + dec!(2), base - dec!(2), base + dec!(1), dec!(10))
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SmcConfig::default();
        config.swing.swing_length = 0;

        let err = SmcEngine::new(config).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_analyze_aligns_all_tables() {
        let mut config = SmcConfig::default();
        config.swing.swing_length = 3;
        let engine = SmcEngine::new(config).unwrap();
        let candles = zigzag(24);

        let analysis = engine.analyze(&candles).unwrap();

        assert_eq!(analysis.swings.len(), 24);
        assert_eq!(analysis.structure.len(), 24);
        assert_eq!(analysis.order_blocks.len(), 24);
        assert_eq!(analysis.liquidity.len(), 24);
        assert_eq!(analysis.swings, engine.swing_highs_lows(&candles).unwrap());
    }

    #[test]
    fn test_engine_uses_configured_strategy() {
        let mut config = SmcConfig::default();
        config.swing.strategy = SwingStrategy::Fractals;
        config.swing.swing_length = 2;
        let engine = SmcEngine::new(config).unwrap();
        let candles = zigzag(12);

        let expected = SwingDetector::new()
            .detect(&candles, SwingParams::new(SwingStrategy::Fractals, 2))
            .unwrap();
        assert_eq!(engine.swing_highs_lows(&candles).unwrap(), expected);
    }

    #[test]
    fn test_empty_analysis_serializes() {
        let engine = SmcEngine::with_defaults();
        let analysis = engine.analyze(&CandleSeries::default()).unwrap();

        assert_eq!(analysis, SmcAnalysis::default());
        assert!(analysis.to_json().unwrap().contains("\"swings\""));
    }
}
