//! 캔들 및 캔들 시퀀스.
//!
//! 이 모듈은 모든 감지기가 공유하는 입력 타입을 정의합니다:
//! - `Candle` - 단일 OHLCV 캔들
//! - `CandleSeries` - 시간 순으로 정렬된 불변 캔들 시퀀스
//!
//! 캔들의 위치 인덱스는 시퀀스 내 0 기반 인덱스입니다.
//! `high >= max(open, close)`, `low <= min(open, close)` 조건은 호출자 계약이며 검증하지 않습니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SmcError, SmcResult};
use crate::types::{Price, Volume};

/// 기본 종가 컬럼 이름.
pub const DEFAULT_CLOSE_COLUMN: &str = "close";

/// OHLCV 캔들.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시작 시간
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<DateTime<Utc>>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(open: Price, high: Price, low: Price, close: Price, volume: Volume) -> Self {
        Self {
            open_time: None,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들 시작 시간을 설정합니다.
    pub fn with_open_time(mut self, open_time: DateTime<Utc>) -> Self {
        self.open_time = Some(open_time);
        self
    }

    /// 몸통 상단 (시가와 종가 중 큰 값).
    pub fn body_top(&self) -> Price {
        self.open.max(self.close)
    }

    /// 몸통 하단 (시가와 종가 중 작은 값).
    pub fn body_bottom(&self) -> Price {
        self.open.min(self.close)
    }
}

/// 시간 순으로 정렬된 캔들 시퀀스.
///
/// 한 번 생성되면 변경되지 않으며, 모든 감지기는 이 시퀀스를 읽기만 합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// 캔들 목록으로 시퀀스를 생성합니다.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    /// 이름 있는 컬럼 묶음으로 시퀀스를 생성합니다.
    ///
    /// 컬럼 이름은 대소문자를 구분하지 않습니다. `close_column`으로 지정한 컬럼이
    /// 종가 역할을 하며, 나머지(open/high/low/volume) 정렬은 그대로 유지됩니다.
    ///
    /// # 에러
    ///
    /// - 필수 컬럼이 없으면 `SmcError::MissingColumn`
    /// - 컬럼 길이가 서로 다르면 `SmcError::ColumnLengthMismatch`
    pub fn from_columns(
        columns: &HashMap<String, Vec<Decimal>>,
        close_column: &str,
    ) -> SmcResult<Self> {
        let normalized: HashMap<String, &Vec<Decimal>> = columns
            .iter()
            .map(|(name, values)| (name.to_lowercase(), values))
            .collect();

        let close_name = close_column.trim().to_lowercase();
        let open = required_column(&normalized, "open")?;
        let high = required_column(&normalized, "high")?;
        let low = required_column(&normalized, "low")?;
        let close = required_column(&normalized, &close_name)?;
        let volume = required_column(&normalized, "volume")?;

        let expected = open.len();
        for (name, values) in [
            ("high", high),
            ("low", low),
            (close_name.as_str(), close),
            ("volume", volume),
        ] {
            if values.len() != expected {
                return Err(SmcError::ColumnLengthMismatch {
                    column: name.to_string(),
                    expected,
                    actual: values.len(),
                });
            }
        }

        let candles = (0..expected)
            .map(|i| Candle::new(open[i], high[i], low[i], close[i], volume[i]))
            .collect();

        Ok(Self { candles })
    }

    /// 캔들 개수.
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 위치 인덱스의 캔들.
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// 전체 캔들 슬라이스.
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// 캔들 순회.
    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// 앞쪽 `len`개 캔들만 담은 새 시퀀스.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            candles: self.candles[..len.min(self.candles.len())].to_vec(),
        }
    }

    /// 고가 컬럼.
    pub fn highs(&self) -> Vec<Price> {
        self.candles.iter().map(|c| c.high).collect()
    }

    /// 저가 컬럼.
    pub fn lows(&self) -> Vec<Price> {
        self.candles.iter().map(|c| c.low).collect()
    }

    /// 종가 컬럼.
    pub fn closes(&self) -> Vec<Price> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// 거래량 (범위 밖 인덱스는 0).
    pub fn volume_at(&self, index: usize) -> Volume {
        self.candles
            .get(index)
            .map(|c| c.volume)
            .unwrap_or(Decimal::ZERO)
    }

    /// 전체 구간 최고가.
    pub fn max_high(&self) -> Option<Price> {
        self.candles.iter().map(|c| c.high).max()
    }

    /// 전체 구간 최저가.
    pub fn min_low(&self) -> Option<Price> {
        self.candles.iter().map(|c| c.low).min()
    }
}

fn required_column<'a>(
    columns: &HashMap<String, &'a Vec<Decimal>>,
    name: &str,
) -> SmcResult<&'a [Decimal]> {
    columns
        .get(name)
        .map(|values| values.as_slice())
        .ok_or_else(|| SmcError::MissingColumn(name.to_string()))
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self::new(candles)
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
