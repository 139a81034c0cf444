//! 스윙 고점/저점 (Swing Highs and Lows).
//!
//! 각 캔들 위치를 스윙 고점, 스윙 저점, 또는 없음으로 분류합니다.
//! 위치 i의 판정은 i 이하의 캔들만 사용합니다 (lookahead 없음).
//!
//! # 평가 전략
//!
//! - **default**: 고가가 직전 `swing_length`개(자신 포함) 구간 최고가와 같으면 고점
//! - **fractals**: 직전 두 캔들과 직전 구간 최고가를 모두 엄격하게 넘으면 고점
//! - **momentum**: 구간 최고가이면서 `swing_length`기간 종가 변화가 양수면 고점
//! - **weighted_rolling_window**: 고가가 고가 EMA(span = `swing_length`) 이상이면 고점
//! - **combined**: 단기/장기 두 구간에 default 규칙을 적용 (±1 단기, ±2 장기)
//!
//! 저점은 모두 대칭 조건입니다. 한 위치에서 고점과 저점 조건이 동시에 성립하면
//! 서로 상쇄되어 "없음"으로 처리됩니다.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_core::{Candle, CandleSeries, Price, SwingConfig, SwingStrategy};
use tracing::debug;

use super::{IndicatorError, IndicatorResult};

/// 스윙 라벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingLabel {
    /// 스윙 고점 (+1)
    High,
    /// 스윙 저점 (-1)
    Low,
    /// 장기 스윙 고점 (+2, combined 전략 전용)
    LongTermHigh,
    /// 장기 스윙 저점 (-2, combined 전략 전용)
    LongTermLow,
}

impl SwingLabel {
    /// 부호 있는 신호값.
    pub fn signal(self) -> i8 {
        match self {
            SwingLabel::High => 1,
            SwingLabel::Low => -1,
            SwingLabel::LongTermHigh => 2,
            SwingLabel::LongTermLow => -2,
        }
    }

    /// 고점 계열(단기/장기)인지 확인합니다.
    pub fn is_high(self) -> bool {
        matches!(self, SwingLabel::High | SwingLabel::LongTermHigh)
    }

    /// 저점 계열(단기/장기)인지 확인합니다.
    pub fn is_low(self) -> bool {
        matches!(self, SwingLabel::Low | SwingLabel::LongTermLow)
    }

    /// 장기 스윙인지 확인합니다.
    pub fn is_long_term(self) -> bool {
        matches!(self, SwingLabel::LongTermHigh | SwingLabel::LongTermLow)
    }
}

/// 스윙 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// 라벨
    pub label: SwingLabel,
    /// 레벨 (고점은 고가, 저점은 저가)
    pub level: Price,
}

impl SwingPoint {
    /// 새 스윙 포인트를 생성합니다.
    pub fn new(label: SwingLabel, level: Price) -> Self {
        Self { label, level }
    }
}

/// 캔들 위치와 1:1로 정렬된 스윙 포인트 테이블.
///
/// 스윙이 없는 위치는 `None`이며, 가격 0인 스윙과 구분됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingSeries {
    points: Vec<Option<SwingPoint>>,
}

impl SwingSeries {
    /// 위치별 스윙 포인트로 테이블을 생성합니다.
    pub fn from_points(points: Vec<Option<SwingPoint>>) -> Self {
        Self { points }
    }

    /// 위치 개수 (입력 캔들 수와 같음).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 위치 인덱스의 스윙 포인트.
    pub fn get(&self, index: usize) -> Option<SwingPoint> {
        self.points.get(index).copied().flatten()
    }

    /// 위치별 전체 테이블.
    pub fn points(&self) -> &[Option<SwingPoint>] {
        &self.points
    }

    /// 스윙이 있는 위치만 순회합니다.
    pub fn events(&self) -> impl Iterator<Item = (usize, SwingPoint)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, point)| point.map(|p| (i, p)))
    }

    /// 위치 인덱스의 신호값 (+1/-1/+2/-2).
    pub fn signal(&self, index: usize) -> Option<i8> {
        self.get(index).map(|p| p.label.signal())
    }

    /// 위치 인덱스의 레벨.
    pub fn level(&self, index: usize) -> Option<Price> {
        self.get(index).map(|p| p.level)
    }

    /// 고점 계열 스윙 개수.
    pub fn high_count(&self) -> usize {
        self.events().filter(|(_, p)| p.label.is_high()).count()
    }

    /// 저점 계열 스윙 개수.
    pub fn low_count(&self) -> usize {
        self.events().filter(|(_, p)| p.label.is_low()).count()
    }
}

/// 스윙 감지 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwingParams {
    /// 평가 전략 (기본: default).
    pub strategy: SwingStrategy,
    /// 참조 구간 길이 (기본: 10).
    pub swing_length: usize,
    /// combined 단기 구간 길이 (기본: 10).
    pub short_swing_length: usize,
    /// combined 장기 구간 길이 (기본: 50).
    pub long_swing_length: usize,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self {
            strategy: SwingStrategy::Default,
            swing_length: 10,
            short_swing_length: 10,
            long_swing_length: 50,
        }
    }
}

impl SwingParams {
    /// 단일 구간 전략 파라미터를 생성합니다.
    pub fn new(strategy: SwingStrategy, swing_length: usize) -> Self {
        Self {
            strategy,
            swing_length,
            ..Default::default()
        }
    }

    /// combined 전략 파라미터를 생성합니다.
    pub fn combined(short_swing_length: usize, long_swing_length: usize) -> Self {
        Self {
            strategy: SwingStrategy::Combined,
            short_swing_length,
            long_swing_length,
            ..Default::default()
        }
    }

    /// 선택된 전략이 사용하는 구간 길이를 검증합니다.
    pub fn validate(&self) -> IndicatorResult<()> {
        if self.strategy.uses_dual_window() {
            if self.short_swing_length == 0 || self.long_swing_length == 0 {
                return Err(IndicatorError::InvalidParameter(format!(
                    "short_swing_length/long_swing_length는 0보다 커야 합니다 (short={}, long={})",
                    self.short_swing_length, self.long_swing_length
                )));
            }
        } else if self.swing_length == 0 {
            return Err(IndicatorError::InvalidParameter(
                "swing_length는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&SwingConfig> for SwingParams {
    fn from(config: &SwingConfig) -> Self {
        Self {
            strategy: config.strategy,
            swing_length: config.swing_length,
            short_swing_length: config.short_swing_length,
            long_swing_length: config.long_swing_length,
        }
    }
}

/// 스윙 포인트 감지기.
#[derive(Debug, Default)]
pub struct SwingDetector;

impl SwingDetector {
    /// 새로운 스윙 감지기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 스윙 고점/저점 계산.
    ///
    /// # 인자
    /// * `candles` - 캔들 시퀀스
    /// * `params` - 전략 및 구간 길이
    ///
    /// # 반환
    /// 캔들 위치와 1:1로 정렬된 스윙 테이블
    pub fn detect(
        &self,
        candles: &CandleSeries,
        params: SwingParams,
    ) -> IndicatorResult<SwingSeries> {
        params.validate()?;

        let candles_slice = candles.candles();
        let points = match params.strategy {
            SwingStrategy::Default => rolling_extremes(
                candles_slice,
                params.swing_length,
                SwingLabel::High,
                SwingLabel::Low,
            ),
            SwingStrategy::Fractals => fractals(candles_slice, params.swing_length),
            SwingStrategy::Momentum => momentum(candles_slice, params.swing_length),
            SwingStrategy::WeightedRollingWindow => {
                weighted_rolling_window(candles_slice, params.swing_length)
            }
            SwingStrategy::Combined => combined(
                candles_slice,
                params.short_swing_length,
                params.long_swing_length,
            ),
        };

        let series = SwingSeries { points };
        debug!(
            strategy = %params.strategy,
            candles = candles.len(),
            highs = series.high_count(),
            lows = series.low_count(),
            "swing detection complete"
        );

        Ok(series)
    }
}

/// 고점/저점 조건 결합. 동시에 성립하면 상쇄됩니다.
fn classify(
    candle: &Candle,
    high_fired: bool,
    low_fired: bool,
    high_label: SwingLabel,
    low_label: SwingLabel,
) -> Option<SwingPoint> {
    match (high_fired, low_fired) {
        (true, false) => Some(SwingPoint::new(high_label, candle.high)),
        (false, true) => Some(SwingPoint::new(low_label, candle.low)),
        _ => None,
    }
}

/// 구간 최고값 (구간 시작부는 가용 값만으로 계산).
fn rolling_max(values: &[Price], window: usize) -> Vec<Price> {
    rolling_extreme(values, window, |candidate, kept| candidate >= kept)
}

/// 구간 최저값 (구간 시작부는 가용 값만으로 계산).
fn rolling_min(values: &[Price], window: usize) -> Vec<Price> {
    rolling_extreme(values, window, |candidate, kept| candidate <= kept)
}

/// 단조 덱(monotonic deque) 기반 구간 극값. O(n).
fn rolling_extreme(
    values: &[Price],
    window: usize,
    dominates: impl Fn(Price, Price) -> bool,
) -> Vec<Price> {
    // 시퀀스보다 긴 구간은 시퀀스 전체와 같다
    let window = window.min(values.len());
    let mut deque: VecDeque<usize> = VecDeque::with_capacity(window);
    let mut result = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        while let Some(&back) = deque.back() {
            if dominates(value, values[back]) {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back(i);

        if let Some(&front) = deque.front() {
            if i - front >= window {
                deque.pop_front();
            }
        }

        result.push(deque.front().map_or(value, |&front| values[front]));
    }

    result
}

/// 가중평균 반올림 시 입력 소수 자릿수에 더하는 여유 자릿수.
const MEAN_EXTRA_DP: u32 = 8;

/// 가중평균 반올림 자릿수 상한.
const MEAN_MAX_DP: u32 = 24;

/// 편향 보정 지수가중평균 (alpha = 2 / (span + 1)).
///
/// alpha가 유한소수가 아니면 나눗셈 오차가 남으므로, 결과를 입력 정밀도 + 여유 자릿수로
/// 반올림합니다. 입력과 수학적으로 같은 평균은 입력과 정확히 같은 값이 됩니다.
fn weighted_mean(values: &[Price], span: usize) -> Vec<Price> {
    let alpha = Decimal::TWO / (Decimal::from(span) + Decimal::ONE);
    let decay = Decimal::ONE - alpha;

    let mut numerator = Decimal::ZERO;
    let mut denominator = Decimal::ZERO;
    // 지금까지 본 입력의 최대 소수 자릿수 (앞쪽 결과가 뒤쪽 입력에 영향받지 않도록 누적)
    let mut scale = 0;
    values
        .iter()
        .map(|&value| {
            scale = scale.max(value.scale());
            numerator = value + decay * numerator;
            denominator = Decimal::ONE + decay * denominator;
            let dp = scale.saturating_add(MEAN_EXTRA_DP).min(MEAN_MAX_DP);
            (numerator / denominator).round_dp(dp)
        })
        .collect()
}

fn highs_lows(candles: &[Candle]) -> (Vec<Price>, Vec<Price>) {
    candles.iter().map(|c| (c.high, c.low)).unzip()
}

fn rolling_extremes(
    candles: &[Candle],
    window: usize,
    high_label: SwingLabel,
    low_label: SwingLabel,
) -> Vec<Option<SwingPoint>> {
    let (highs, lows) = highs_lows(candles);
    let max_high = rolling_max(&highs, window);
    let min_low = rolling_min(&lows, window);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            classify(
                candle,
                candle.high == max_high[i],
                candle.low == min_low[i],
                high_label,
                low_label,
            )
        })
        .collect()
}

fn fractals(candles: &[Candle], window: usize) -> Vec<Option<SwingPoint>> {
    let (highs, lows) = highs_lows(candles);
    let max_high = rolling_max(&highs, window);
    let min_low = rolling_min(&lows, window);
    // 직전 두 캔들과 직전 구간 전체가 필요
    let start = window.max(2);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            if i < start {
                return None;
            }
            let high_fired = candle.high > highs[i - 1]
                && candle.high > highs[i - 2]
                && candle.high > max_high[i - 1];
            let low_fired = candle.low < lows[i - 1]
                && candle.low < lows[i - 2]
                && candle.low < min_low[i - 1];
            classify(candle, high_fired, low_fired, SwingLabel::High, SwingLabel::Low)
        })
        .collect()
}

fn momentum(candles: &[Candle], window: usize) -> Vec<Option<SwingPoint>> {
    let (highs, lows) = highs_lows(candles);
    let max_high = rolling_max(&highs, window);
    let min_low = rolling_min(&lows, window);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            if i < window {
                return None;
            }
            let change = candle.close - candles[i - window].close;
            let high_fired = candle.high == max_high[i] && change > Decimal::ZERO;
            let low_fired = candle.low == min_low[i] && change < Decimal::ZERO;
            classify(candle, high_fired, low_fired, SwingLabel::High, SwingLabel::Low)
        })
        .collect()
}

fn weighted_rolling_window(candles: &[Candle], span: usize) -> Vec<Option<SwingPoint>> {
    let (highs, lows) = highs_lows(candles);
    let high_mean = weighted_mean(&highs, span);
    let low_mean = weighted_mean(&lows, span);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            classify(
                candle,
                candle.high >= high_mean[i],
                candle.low <= low_mean[i],
                SwingLabel::High,
                SwingLabel::Low,
            )
        })
        .collect()
}

/// 장기 스윙이 있으면 장기를, 없으면 단기를 채택합니다.
fn combined(candles: &[Candle], short_window: usize, long_window: usize) -> Vec<Option<SwingPoint>> {
    let short = rolling_extremes(candles, short_window, SwingLabel::High, SwingLabel::Low);
    let long = rolling_extremes(
        candles,
        long_window,
        SwingLabel::LongTermHigh,
        SwingLabel::LongTermLow,
    );

    long.into_iter()
        .zip(short)
        .map(|(long_point, short_point)| long_point.or(short_point))
        .collect()
}
