//! 유동성 존 (Liquidity Zone).
//!
//! 서로 가까운(전체 가격 범위 × `range_percent` 이내) 같은 방향 스윙 레벨이 2개 이상 모이면
//! 유동성 존으로 봅니다. 존은 가격이 밴드 바깥쪽 경계에 닿는 캔들에서 스윕(sweep)됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_core::{CandleSeries, LiquidityConfig, Price};
use tracing::{debug, trace};

use super::{
    ensure_aligned, Direction, IndicatorError, IndicatorResult, SwingPoint, SwingSeries,
};

/// 감지된 유동성 존.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityZone {
    /// 방향 (강세: 스윙 고점 클러스터, 약세: 스윙 저점 클러스터)
    pub direction: Direction,
    /// 구성 스윙 레벨의 평균
    pub level: Price,
    /// 시작 스윙 위치
    pub start_index: usize,
    /// 마지막으로 합류한 스윙 위치
    pub end_index: usize,
    /// 스윕한 캔들 위치 (없으면 미스윕)
    pub swept_index: Option<usize>,
    /// 구성 스윙 개수 (항상 2 이상)
    pub members: usize,
}

/// 유동성 존 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityParams {
    /// 전체 가격 범위 대비 밴드 반폭 비율 (기본: 0.01)
    pub range_percent: Decimal,
}

impl Default for LiquidityParams {
    fn default() -> Self {
        Self {
            range_percent: Decimal::new(1, 2),
        }
    }
}

impl From<&LiquidityConfig> for LiquidityParams {
    fn from(config: &LiquidityConfig) -> Self {
        Self {
            range_percent: config.range_percent,
        }
    }
}

impl LiquidityParams {
    /// 파라미터 검증.
    pub fn validate(&self) -> IndicatorResult<()> {
        if self.range_percent <= Decimal::ZERO {
            return Err(IndicatorError::InvalidParameter(format!(
                "range_percent는 0보다 커야 합니다: {}",
                self.range_percent
            )));
        }
        Ok(())
    }
}

/// 캔들 위치와 1:1로 정렬된 유동성 존 테이블 (존은 시작 스윙 위치에 기록).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySeries {
    zones: Vec<Option<LiquidityZone>>,
}

impl LiquiditySeries {
    /// 위치 개수.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// 위치 인덱스의 유동성 존.
    pub fn get(&self, index: usize) -> Option<LiquidityZone> {
        self.zones.get(index).copied().flatten()
    }

    /// 위치별 전체 테이블.
    pub fn zones(&self) -> &[Option<LiquidityZone>] {
        &self.zones
    }

    /// 감지된 존만 순회합니다.
    pub fn events(&self) -> impl Iterator<Item = LiquidityZone> + '_ {
        self.zones.iter().flatten().copied()
    }

    /// 강세(고점) 존 개수.
    pub fn bullish_count(&self) -> usize {
        self.events()
            .filter(|z| z.direction == Direction::Bullish)
            .count()
    }

    /// 약세(저점) 존 개수.
    pub fn bearish_count(&self) -> usize {
        self.events()
            .filter(|z| z.direction == Direction::Bearish)
            .count()
    }
}

/// 유동성 존 감지기.
#[derive(Debug, Default)]
pub struct LiquidityDetector;

impl LiquidityDetector {
    /// 새로운 유동성 존 감지기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 유동성 존 계산.
    ///
    /// 스윙 고점 전체를 먼저 처리한 뒤 스윙 저점을 처리합니다. 다른 존에 합류한 스윙은
    /// 이후 새 존의 시작점이 될 수 없습니다. 입력 스윙 시리즈는 변경되지 않습니다.
    pub fn detect(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
        params: LiquidityParams,
    ) -> IndicatorResult<LiquiditySeries> {
        params.validate()?;
        ensure_aligned(candles, swings)?;

        let mut zones: Vec<Option<LiquidityZone>> = vec![None; candles.len()];
        let (Some(max_high), Some(min_low)) = (candles.max_high(), candles.min_low()) else {
            return Ok(LiquiditySeries { zones });
        };
        let pip_range = (max_high - min_low)
            .checked_mul(params.range_percent)
            .ok_or_else(|| {
                IndicatorError::InvalidParameter(format!(
                    "range_percent가 너무 큽니다: {}",
                    params.range_percent
                ))
            })?;

        // 합류로 소비된 스윙을 지우는 작업용 복사본
        let mut working: Vec<Option<SwingPoint>> = swings.points().to_vec();

        for direction in [Direction::Bullish, Direction::Bearish] {
            for start in 0..working.len() {
                let Some(seed) = working[start].filter(|p| matches_side(p, direction)) else {
                    continue;
                };
                if let Some(zone) = cluster(candles, &mut working, start, seed, direction, pip_range)
                {
                    trace!(
                        start,
                        end = zone.end_index,
                        level = %zone.level,
                        members = zone.members,
                        swept = ?zone.swept_index,
                        "liquidity zone detected"
                    );
                    zones[start] = Some(zone);
                }
            }
        }

        let series = LiquiditySeries { zones };
        debug!(
            candles = candles.len(),
            pip_range = %pip_range,
            bullish = series.bullish_count(),
            bearish = series.bearish_count(),
            "liquidity detection complete"
        );

        Ok(series)
    }
}

fn matches_side(point: &SwingPoint, direction: Direction) -> bool {
    match direction {
        Direction::Bullish => point.label.is_high(),
        Direction::Bearish => point.label.is_low(),
    }
}

/// `start` 스윙을 시작으로 밴드 안의 같은 방향 스윙을 모읍니다.
///
/// 같은 캔들에서는 합류 판정을 스윕 판정보다 먼저 합니다.
fn cluster(
    candles: &CandleSeries,
    working: &mut [Option<SwingPoint>],
    start: usize,
    seed: SwingPoint,
    direction: Direction,
    pip_range: Decimal,
) -> Option<LiquidityZone> {
    let band_low = seed.level.saturating_sub(pip_range);
    let band_high = seed.level.saturating_add(pip_range);

    let mut levels: Vec<Price> = vec![seed.level];
    let mut end_index = start;
    let mut swept_index = None;

    for (k, candle) in candles.iter().enumerate().skip(start + 1) {
        if let Some(point) = working[k] {
            if matches_side(&point, direction) && band_low <= point.level && point.level <= band_high
            {
                levels.push(point.level);
                end_index = k;
                working[k] = None;
            }
        }

        let swept = match direction {
            Direction::Bullish => candle.high >= band_high,
            Direction::Bearish => candle.low <= band_low,
        };
        if swept {
            swept_index = Some(k);
            break;
        }
    }

    if levels.len() < 2 {
        return None;
    }

    let total: Decimal = levels.iter().copied().sum();
    Some(LiquidityZone {
        direction,
        level: total / Decimal::from(levels.len()),
        start_index: start,
        end_index,
        swept_index,
        members: levels.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::SwingLabel;
    use rust_decimal_macros::dec;
    use smc_core::Candle;

    fn candles_from_ranges(ranges: &[(Decimal, Decimal)]) -> CandleSeries {
        ranges
            .iter()
            .map(|&(high, low)| Candle::new(low, high, low, high, dec!(1)))
            .collect::<Vec<_>>()
            .into()
    }

    fn highs_scenario() -> (CandleSeries, SwingSeries) {
        let candles = candles_from_ranges(&[
            (dec!(101), dec!(100)),
            (dec!(105), dec!(102)),
            (dec!(104), dec!(102)),
            (dec!(105.05), dec!(103)),
            (dec!(104), dec!(102)),
            (dec!(110), dec!(104)),
            (dec!(108), dec!(104)),
        ]);
        let mut points = vec![None; candles.len()];
        points[1] = Some(SwingPoint::new(SwingLabel::High, dec!(105)));
        points[3] = Some(SwingPoint::new(SwingLabel::High, dec!(105.05)));
        points[5] = Some(SwingPoint::new(SwingLabel::High, dec!(110)));
        (candles, SwingSeries::from_points(points))
    }

    #[test]
    fn test_high_cluster_swept() {
        let (candles, swings) = highs_scenario();

        let result = LiquidityDetector::new()
            .detect(&candles, &swings, LiquidityParams::default())
            .unwrap();

        let zone = result.get(1).unwrap();
        assert_eq!(zone.direction, Direction::Bullish);
        assert_eq!(zone.level, dec!(105.025));
        assert_eq!(zone.start_index, 1);
        assert_eq!(zone.end_index, 3);
        assert_eq!(zone.swept_index, Some(5));
        assert_eq!(zone.members, 2);

        // 합류한 스윙(3)과 홀로 있는 스윙(5)은 존을 만들지 않는다
        assert_eq!(result.get(3), None);
        assert_eq!(result.get(5), None);
        assert_eq!(result.events().count(), 1);
    }

    #[test]
    fn test_input_swings_unchanged() {
        let (candles, swings) = highs_scenario();
        let before = swings.clone();

        LiquidityDetector::new()
            .detect(&candles, &swings, LiquidityParams::default())
            .unwrap();

        assert_eq!(swings, before);
    }

    #[test]
    fn test_unswept_low_cluster() {
        let candles = candles_from_ranges(&[
            (dec!(110), dec!(105)),
            (dec!(104), dec!(100)),
            (dec!(106), dec!(102)),
            (dec!(104), dec!(100.05)),
            (dec!(107), dec!(103)),
        ]);
        let mut points = vec![None; candles.len()];
        points[1] = Some(SwingPoint::new(SwingLabel::Low, dec!(100)));
        points[3] = Some(SwingPoint::new(SwingLabel::LongTermLow, dec!(100.05)));
        let swings = SwingSeries::from_points(points);

        let result = LiquidityDetector::new()
            .detect(&candles, &swings, LiquidityParams::default())
            .unwrap();

        let zone = result.get(1).unwrap();
        assert_eq!(zone.direction, Direction::Bearish);
        assert_eq!(zone.level, dec!(100.025));
        assert_eq!(zone.end_index, 3);
        assert_eq!(zone.swept_index, None);
        assert_eq!(result.bearish_count(), 1);
    }

    #[test]
    fn test_low_cluster_swept_by_lower_bound() {
        let candles = candles_from_ranges(&[
            (dec!(110), dec!(105)),
            (dec!(104), dec!(100)),
            (dec!(106), dec!(102)),
            (dec!(104), dec!(100.05)),
            (dec!(103), dec!(99.8)),
            (dec!(105), dec!(101)),
        ]);
        let mut points = vec![None; candles.len()];
        points[1] = Some(SwingPoint::new(SwingLabel::Low, dec!(100)));
        points[3] = Some(SwingPoint::new(SwingLabel::Low, dec!(100.05)));
        let swings = SwingSeries::from_points(points);

        let result = LiquidityDetector::new()
            .detect(&candles, &swings, LiquidityParams::default())
            .unwrap();

        // 밴드 반폭 = (110 - 99.8) * 0.01 = 0.102, 하단 경계 99.898
        let zone = result.get(1).unwrap();
        assert_eq!(zone.direction, Direction::Bearish);
        assert_eq!(zone.level, dec!(100.025));
        assert_eq!(zone.end_index, 3);
        assert_eq!(zone.swept_index, Some(4));
        assert_eq!(zone.members, 2);
    }

    #[test]
    fn test_overflowing_range_percent_rejected() {
        let (candles, swings) = highs_scenario();
        let params = LiquidityParams {
            range_percent: Decimal::MAX,
        };

        let err = LiquidityDetector::new()
            .detect(&candles, &swings, params)
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_huge_band_never_swept() {
        let (candles, swings) = highs_scenario();
        let params = LiquidityParams {
            range_percent: Decimal::from(1_000_000_000_000_000_000u64),
        };

        let result = LiquidityDetector::new()
            .detect(&candles, &swings, params)
            .unwrap();

        // 모든 스윙 고점이 하나의 존에 합류
        let zone = result.get(1).unwrap();
        assert_eq!(zone.members, 3);
        assert_eq!(zone.end_index, 5);
        assert_eq!(zone.swept_index, None);
    }

    #[test]
    fn test_single_swing_is_not_a_zone() {
        let candles = candles_from_ranges(&[
            (dec!(101), dec!(100)),
            (dec!(105), dec!(102)),
            (dec!(104), dec!(102)),
        ]);
        let mut points = vec![None; candles.len()];
        points[1] = Some(SwingPoint::new(SwingLabel::High, dec!(105)));
        let swings = SwingSeries::from_points(points);

        let result = LiquidityDetector::new()
            .detect(&candles, &swings, LiquidityParams::default())
            .unwrap();
        assert_eq!(result.events().count(), 0);
    }

    #[test]
    fn test_invalid_range_percent() {
        let (candles, swings) = highs_scenario();
        let params = LiquidityParams {
            range_percent: Decimal::ZERO,
        };

        let err = LiquidityDetector::new()
            .detect(&candles, &swings, params)
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_empty_input() {
        let result = LiquidityDetector::new()
            .detect(
                &CandleSeries::default(),
                &SwingSeries::default(),
                LiquidityParams::default(),
            )
            .unwrap();
        assert!(result.is_empty());
    }
}
