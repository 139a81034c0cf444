//! 설정 관리.
//!
//! 감지기별 설정 섹션을 정의하고, TOML 파일과 환경 변수에서 로드합니다.
//! 모든 섹션은 생략 가능하며 생략 시 기본값이 사용됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::DEFAULT_CLOSE_COLUMN;
use crate::error::{SmcError, SmcResult};
use crate::logging::LogFormat;
use crate::types::SwingStrategy;

/// 환경 변수 오버라이드 접두사.
pub const ENV_PREFIX: &str = "SMC";

/// 분석 설정.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SmcConfig {
    /// 입력 컬럼 설정
    pub input: InputConfig,
    /// 스윙 포인트 감지 설정
    pub swing: SwingConfig,
    /// 구조 돌파(BOS/CHoCH) 감지 설정
    pub structure: StructureConfig,
    /// 오더블록 감지 설정
    pub order_block: OrderBlockConfig,
    /// 유동성 존 감지 설정
    pub liquidity: LiquidityConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 입력 컬럼 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// 종가로 사용할 컬럼 이름 (대소문자 무시)
    pub close_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            close_column: DEFAULT_CLOSE_COLUMN.to_string(),
        }
    }
}

/// 스윙 포인트 감지 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SwingConfig {
    /// 평가 전략
    pub strategy: SwingStrategy,
    /// 참조 구간 길이 (캔들 수)
    pub swing_length: usize,
    /// combined 전략의 단기 구간 길이
    pub short_swing_length: usize,
    /// combined 전략의 장기 구간 길이
    pub long_swing_length: usize,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            strategy: SwingStrategy::Default,
            swing_length: 10,
            short_swing_length: 10,
            long_swing_length: 50,
        }
    }
}

/// 구조 돌파 감지 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StructureConfig {
    /// true면 종가, false면 고가/저가(꼬리)로 돌파 판정
    pub close_break: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self { close_break: true }
    }
}

/// 오더블록 감지 설정.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderBlockConfig {
    /// true면 몸통(시가/종가), false면 고가/저가(꼬리)로 무효화 판정
    pub close_mitigation: bool,
}

/// 유동성 존 감지 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// 허용 밴드 비율 (전체 가격 범위 대비)
    pub range_percent: Decimal,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            range_percent: Decimal::new(1, 2),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl SmcConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `SMC__SWING__SWING_LENGTH=20` 형식으로 오버라이드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> SmcResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 미적용).
    pub fn from_toml_str(content: &str) -> SmcResult<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> SmcResult<Self> {
        Self::load("config/default.toml")
    }

    /// 스캔 시작 전에 설정 값을 검증합니다.
    pub fn validate(&self) -> SmcResult<()> {
        let swing = &self.swing;
        if swing.strategy.uses_dual_window() {
            if swing.short_swing_length == 0 || swing.long_swing_length == 0 {
                return Err(SmcError::InvalidParameter(format!(
                    "short_swing_length/long_swing_length는 0보다 커야 합니다 (short={}, long={})",
                    swing.short_swing_length, swing.long_swing_length
                )));
            }
        } else if swing.swing_length == 0 {
            return Err(SmcError::InvalidParameter(
                "swing_length는 0보다 커야 합니다".to_string(),
            ));
        }

        if self.liquidity.range_percent <= Decimal::ZERO {
            return Err(SmcError::InvalidParameter(format!(
                "range_percent는 0보다 커야 합니다: {}",
                self.liquidity.range_percent
            )));
        }

        if self.input.close_column.trim().is_empty() {
            return Err(SmcError::InvalidParameter(
                "close_column이 비어 있습니다".to_string(),
            ));
        }

        self.logging
            .format
            .parse::<LogFormat>()
            .map_err(SmcError::InvalidParameter)?;

        Ok(())
    }
}
