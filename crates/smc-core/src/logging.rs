//! tracing을 사용한 로깅 인프라.
//!
//! 출력 형식은 `[logging]` 설정 섹션의 `format`으로 고릅니다:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 로그 집계용 JSON 형식
//! - **compact**: 한 줄 형식
//!
//! 감지기는 스스로 subscriber를 설치하지 않습니다. 호출자가 `init_logging`으로 한 번 초기화합니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{SmcError, SmcResult};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// `[logging]` 설정으로 전역 subscriber를 설치합니다.
///
/// 레벨 문자열은 `EnvFilter` 지시어 문법을 따릅니다 (예: `"info"`, `"smc_analytics=trace"`).
/// 이미 subscriber가 설치되어 있으면 `SmcError::Config`를 반환합니다.
///
/// # 예제
///
/// ```no_run
/// use smc_core::{init_logging, SmcConfig};
///
/// let config = SmcConfig::load_default().unwrap();
/// init_logging(&config.logging).unwrap();
/// ```
pub fn init_logging(settings: &LoggingConfig) -> SmcResult<()> {
    let format: LogFormat = settings.format.parse().map_err(SmcError::InvalidParameter)?;
    let env_filter = EnvFilter::try_new(&settings.level)
        .map_err(|e| SmcError::Config(format!("잘못된 로그 레벨 '{}': {}", settings.level, e)))?;

    let base = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(true);
    let fmt_layer = match format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| SmcError::Config(format!("로깅 초기화 실패: {}", e)))?;

    tracing::info!(
        format = ?format,
        level = %settings.level,
        "Logging initialized"
    );

    Ok(())
}

/// 감지기 실행 컨텍스트 필드가 포함된 span을 생성하는 매크로.
#[macro_export]
macro_rules! analysis_span {
    ($name:expr, $candles:expr, $strategy:expr) => {
        tracing::info_span!($name, candles = $candles, strategy = %$strategy)
    };
}
