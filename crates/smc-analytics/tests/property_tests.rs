//! 감지기 속성 테스트.
//!
//! 임의의 캔들 시퀀스에 대해 항상 성립해야 하는 성질을 검증합니다.
//! 가격은 작은 정수 범위에서 생성해 동률(tie)이 자주 나오도록 합니다.

use proptest::prelude::*;
use rust_decimal::Decimal;

use smc_analytics::{
    Direction, LiquidityDetector, LiquidityParams, MarketStructureDetector, OrderBlockDetector,
    OrderBlockParams, StructureParams, SwingDetector, SwingLabel, SwingParams,
};
use smc_core::{Candle, CandleSeries, SwingStrategy};

fn candle_series(max_len: usize) -> impl Strategy<Value = CandleSeries> {
    prop::collection::vec((90i64..110, 0i64..4, 0i64..4, -3i64..4, 0i64..50), 0..max_len).prop_map(
        |rows| {
            CandleSeries::new(
                rows.into_iter()
                    .map(|(open, up, down, body, volume)| {
                        let open = Decimal::from(open);
                        let close = open + Decimal::from(body);
                        let high = open.max(close) + Decimal::from(up);
                        let low = open.min(close) - Decimal::from(down);
                        Candle::new(open, high, low, close, Decimal::from(volume))
                    })
                    .collect(),
            )
        },
    )
}

fn swing_params() -> impl Strategy<Value = SwingParams> {
    (
        prop::sample::select(SwingStrategy::ALL.to_vec()),
        1usize..6,
        1usize..4,
        4usize..9,
    )
        .prop_map(|(strategy, swing_length, short, long)| SwingParams {
            strategy,
            swing_length,
            short_swing_length: short,
            long_swing_length: long,
        })
}

/// 시작부가 잘린 후행 구간의 극값 (단순 계산).
fn naive_window(values: &[Decimal], i: usize, window: usize, pick_max: bool) -> Decimal {
    let start = (i + 1).saturating_sub(window);
    let slice = &values[start..=i];
    let extreme = if pick_max {
        slice.iter().max()
    } else {
        slice.iter().min()
    };
    extreme.copied().unwrap_or(Decimal::ZERO)
}

proptest! {
    #[test]
    fn swing_levels_match_candle_extremes(candles in candle_series(60), params in swing_params()) {
        let swings = SwingDetector::new().detect(&candles, params).unwrap();
        prop_assert_eq!(swings.len(), candles.len());

        for (i, point) in swings.events() {
            let candle = candles.get(i).unwrap();
            if point.label.is_high() {
                prop_assert_eq!(point.level, candle.high);
            } else {
                prop_assert_eq!(point.level, candle.low);
            }
            if params.strategy != SwingStrategy::Combined {
                prop_assert!(!point.label.is_long_term());
            }
        }
    }

    #[test]
    fn default_strategy_matches_window_extremes(candles in candle_series(60), window in 1usize..8) {
        let params = SwingParams::new(SwingStrategy::Default, window);
        let swings = SwingDetector::new().detect(&candles, params).unwrap();
        let highs = candles.highs();
        let lows = candles.lows();

        for i in 0..candles.len() {
            let is_max = highs[i] == naive_window(&highs, i, window, true);
            let is_min = lows[i] == naive_window(&lows, i, window, false);
            let expected = match (is_max, is_min) {
                (true, false) => Some(SwingLabel::High),
                (false, true) => Some(SwingLabel::Low),
                _ => None,
            };
            prop_assert_eq!(swings.get(i).map(|p| p.label), expected);
        }
    }

    #[test]
    fn swings_use_no_future_candles(
        candles in candle_series(50),
        params in swing_params(),
        cut in 0usize..50,
    ) {
        let full = SwingDetector::new().detect(&candles, params).unwrap();
        let prefix = candles.prefix(cut);
        let partial = SwingDetector::new().detect(&prefix, params).unwrap();

        prop_assert_eq!(partial.points(), &full.points()[..prefix.len()]);
    }

    #[test]
    fn detection_is_deterministic(candles in candle_series(50), params in swing_params()) {
        let detector = SwingDetector::new();
        let first = detector.detect(&candles, params).unwrap();
        let second = detector.detect(&candles, params).unwrap();
        prop_assert_eq!(&first, &second);

        let structure = MarketStructureDetector::new();
        prop_assert_eq!(
            structure.detect(&candles, &first, StructureParams::default()).unwrap(),
            structure.detect(&candles, &second, StructureParams::default()).unwrap()
        );
    }

    #[test]
    fn confirmed_breaks_cross_their_level(
        candles in candle_series(80),
        window in 1usize..5,
        close_break in any::<bool>(),
    ) {
        let swings = SwingDetector::new()
            .detect(&candles, SwingParams::new(SwingStrategy::Default, window))
            .unwrap();
        let breaks = MarketStructureDetector::new()
            .detect(&candles, &swings, StructureParams { close_break })
            .unwrap();

        for event in breaks.events() {
            prop_assert!(event.broken_index > event.origin_index + 1);
            prop_assert_eq!(swings.level(event.origin_index), Some(event.level));

            let candle = candles.get(event.broken_index).unwrap();
            match event.direction {
                Direction::Bullish => {
                    let price = if close_break { candle.close } else { candle.high };
                    prop_assert!(price > event.level);
                }
                Direction::Bearish => {
                    let price = if close_break { candle.close } else { candle.low };
                    prop_assert!(price < event.level);
                }
            }
        }
    }

    #[test]
    fn surviving_breaks_are_ordered_by_break_index(
        candles in candle_series(80),
        window in 1usize..5,
        close_break in any::<bool>(),
    ) {
        let swings = SwingDetector::new()
            .detect(&candles, SwingParams::new(SwingStrategy::Default, window))
            .unwrap();
        let breaks = MarketStructureDetector::new()
            .detect(&candles, &swings, StructureParams { close_break })
            .unwrap();

        // 기준 위치 순으로 남은 이벤트는 돌파 위치도 엄격히 증가
        let events: Vec<_> = breaks.events().collect();
        for pair in events.windows(2) {
            prop_assert!(pair[0].origin_index < pair[1].origin_index);
            prop_assert!(
                pair[0].broken_index < pair[1].broken_index,
                "origin {} broken {} / origin {} broken {}",
                pair[0].origin_index,
                pair[0].broken_index,
                pair[1].origin_index,
                pair[1].broken_index
            );
        }
    }

    #[test]
    fn order_block_strength_is_bounded(
        candles in candle_series(80),
        window in 1usize..5,
        close_mitigation in any::<bool>(),
    ) {
        let swings = SwingDetector::new()
            .detect(&candles, SwingParams::new(SwingStrategy::Default, window))
            .unwrap();
        let blocks = OrderBlockDetector::new()
            .detect(&candles, &swings, OrderBlockParams { close_mitigation })
            .unwrap();

        let hundred = Decimal::ONE_HUNDRED;
        for block in blocks.events() {
            prop_assert!(block.percentage >= Decimal::ZERO);
            prop_assert!(block.percentage <= hundred);
            prop_assert!(block.bottom <= block.top);
            if let Some(mitigated) = block.mitigated_index {
                prop_assert!(mitigated > block.origin_index);
            }
        }
    }

    #[test]
    fn liquidity_zones_have_multiple_members(
        candles in candle_series(80),
        window in 1usize..5,
        percent in 1i64..20,
    ) {
        let swings = SwingDetector::new()
            .detect(&candles, SwingParams::new(SwingStrategy::Default, window))
            .unwrap();
        let params = LiquidityParams { range_percent: Decimal::new(percent, 2) };
        let zones = LiquidityDetector::new().detect(&candles, &swings, params).unwrap();

        for zone in zones.events() {
            prop_assert!(zone.members >= 2);
            prop_assert!(zone.end_index > zone.start_index);
            if let Some(swept) = zone.swept_index {
                prop_assert!(swept > zone.start_index);
                prop_assert!(swept >= zone.end_index);
            }
        }
    }
}
