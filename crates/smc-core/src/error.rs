//! 시장 구조 분석 시스템의 에러 타입.
//!
//! 입력 스키마 오류와 설정 오류는 스캔이 시작되기 전에 즉시 반환됩니다.
//! 데이터 부족(스윙 포인트가 4개 미만 등)은 에러가 아니며 "이벤트 없음"으로 처리됩니다.

use thiserror::Error;

/// 핵심 분석 에러.
#[derive(Debug, Error)]
pub enum SmcError {
    /// 필수 컬럼 누락 (스키마 에러)
    #[error("필수 컬럼이 없습니다: \"{0}\"")]
    MissingColumn(String),

    /// 컬럼 길이 불일치 (스키마 에러)
    #[error("컬럼 길이 불일치: \"{column}\" 컬럼 {actual}개, 기대값 {expected}개")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// 잘못된 파라미터 (설정 에러)
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 알 수 없는 스윙 평가 전략 (설정 에러)
    #[error("알 수 없는 스윙 전략: {0}")]
    UnknownStrategy(String),

    /// 설정 로드 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 분석 작업을 위한 Result 타입.
pub type SmcResult<T> = Result<T, SmcError>;

impl SmcError {
    /// 입력 스키마 에러인지 확인합니다.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            SmcError::MissingColumn(_) | SmcError::ColumnLengthMismatch { .. }
        )
    }

    /// 설정 에러인지 확인합니다.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SmcError::InvalidParameter(_) | SmcError::UnknownStrategy(_) | SmcError::Config(_)
        )
    }
}

impl From<serde_json::Error> for SmcError {
    fn from(err: serde_json::Error) -> Self {
        SmcError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for SmcError {
    fn from(err: config::ConfigError) -> Self {
        SmcError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_schema() {
        let missing = SmcError::MissingColumn("volume".to_string());
        assert!(missing.is_schema_error());
        assert!(!missing.is_config_error());

        let mismatch = SmcError::ColumnLengthMismatch {
            column: "high".to_string(),
            expected: 10,
            actual: 9,
        };
        assert!(mismatch.is_schema_error());
    }

    #[test]
    fn test_error_config() {
        let unknown = SmcError::UnknownStrategy("zigzag".to_string());
        assert!(unknown.is_config_error());

        let invalid = SmcError::InvalidParameter("swing_length = 0".to_string());
        assert!(invalid.is_config_error());
        assert!(!invalid.is_schema_error());
    }

    #[test]
    fn test_error_message() {
        let err = SmcError::MissingColumn("close".to_string());
        assert!(err.to_string().contains("\"close\""));
    }
}
