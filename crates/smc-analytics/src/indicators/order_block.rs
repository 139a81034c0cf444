//! 오더블록 (Order Block).
//!
//! 직전 스윙 고점(저점)을 종가로 처음 돌파하는 캔들이 나오면, 그 앞 구간에서
//! 가장 낮은 저가(강세) 또는 가장 높은 고가(약세)를 가진 캔들을 블록의 기준(anchor)으로
//! 삼아 가격 범위를 기록합니다. 이후 가격이 범위에 재진입하면 블록은 무효화(mitigation)됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smc_core::{Candle, CandleSeries, OrderBlockConfig, Percentage, Price, Volume};
use tracing::{debug, trace};

use super::{ensure_aligned, Direction, IndicatorResult, SwingSeries};

/// 감지된 오더블록.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBlock {
    /// 방향
    pub direction: Direction,
    /// 상단 가격
    pub top: Price,
    /// 하단 가격
    pub bottom: Price,
    /// 돌파 캔들까지 3개 캔들의 거래량 합
    pub volume: Volume,
    /// 거래량 기반 강도 (0 ~ 100)
    pub percentage: Percentage,
    /// 기준 캔들 위치
    pub origin_index: usize,
    /// 처음 범위에 재진입한 캔들 위치 (없으면 미무효화)
    pub mitigated_index: Option<usize>,
}

impl OrderBlock {
    /// 무효화 여부.
    pub fn is_mitigated(&self) -> bool {
        self.mitigated_index.is_some()
    }
}

/// 오더블록 파라미터.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBlockParams {
    /// true면 몸통(시가/종가), false면 고가/저가로 무효화 판정 (기본: false).
    pub close_mitigation: bool,
}

impl From<&OrderBlockConfig> for OrderBlockParams {
    fn from(config: &OrderBlockConfig) -> Self {
        Self {
            close_mitigation: config.close_mitigation,
        }
    }
}

/// 캔들 위치와 1:1로 정렬된 오더블록 테이블 (블록은 기준 캔들 위치에 기록).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBlockSeries {
    blocks: Vec<Option<OrderBlock>>,
}

impl OrderBlockSeries {
    /// 위치 개수.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 위치 인덱스의 오더블록.
    pub fn get(&self, index: usize) -> Option<OrderBlock> {
        self.blocks.get(index).copied().flatten()
    }

    /// 위치별 전체 테이블.
    pub fn blocks(&self) -> &[Option<OrderBlock>] {
        &self.blocks
    }

    /// 감지된 블록만 순회합니다.
    pub fn events(&self) -> impl Iterator<Item = OrderBlock> + '_ {
        self.blocks.iter().flatten().copied()
    }

    /// 강세 블록 개수.
    pub fn bullish_count(&self) -> usize {
        self.events()
            .filter(|b| b.direction == Direction::Bullish)
            .count()
    }

    /// 약세 블록 개수.
    pub fn bearish_count(&self) -> usize {
        self.events()
            .filter(|b| b.direction == Direction::Bearish)
            .count()
    }

    /// 아직 무효화되지 않은 블록 개수.
    pub fn active_count(&self) -> usize {
        self.events().filter(|b| !b.is_mitigated()).count()
    }
}

/// 오더블록 감지기.
#[derive(Debug, Default)]
pub struct OrderBlockDetector;

impl OrderBlockDetector {
    /// 새로운 오더블록 감지기 생성.
    pub fn new() -> Self {
        Self
    }

    /// 오더블록 계산.
    ///
    /// 캔들을 한 번 순회하며, 각 위치에서 먼저 활성 블록의 무효화를 확인한 뒤
    /// 새 블록 형성을 확인합니다. 스윙 포인트는 다음 위치부터 "직전 스윙"이 됩니다.
    pub fn detect(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
        params: OrderBlockParams,
    ) -> IndicatorResult<OrderBlockSeries> {
        ensure_aligned(candles, swings)?;

        let rows = candles.candles();
        let mut blocks: Vec<Option<OrderBlock>> = vec![None; rows.len()];
        let mut crossed = vec![false; rows.len()];
        // 무효화되지 않은 블록의 기준 위치
        let mut active: Vec<usize> = Vec::new();
        let mut last_high: Option<usize> = None;
        let mut last_low: Option<usize> = None;

        for (i, candle) in rows.iter().enumerate() {
            active.retain(|&origin| {
                let Some(block) = blocks[origin].as_mut() else {
                    return false;
                };
                if !mitigates(candle, block, params.close_mitigation) {
                    return true;
                }
                block.mitigated_index = Some(i);
                trace!(origin, mitigated_index = i, "order block mitigated");
                false
            });

            if let Some(h) = last_high.filter(|&h| !crossed[h]) {
                if candle.close > rows[h].high {
                    crossed[h] = true;
                    let block = build_block(candles, i, Direction::Bullish);
                    store(&mut blocks, &mut active, block);
                }
            }

            if let Some(l) = last_low.filter(|&l| !crossed[l]) {
                if candle.close < rows[l].low {
                    crossed[l] = true;
                    let block = build_block(candles, i, Direction::Bearish);
                    store(&mut blocks, &mut active, block);
                }
            }

            match swings.get(i) {
                Some(point) if point.label.is_high() => last_high = Some(i),
                Some(point) if point.label.is_low() => last_low = Some(i),
                _ => {}
            }
        }

        let series = OrderBlockSeries { blocks };
        debug!(
            candles = candles.len(),
            bullish = series.bullish_count(),
            bearish = series.bearish_count(),
            active = series.active_count(),
            close_mitigation = params.close_mitigation,
            "order block detection complete"
        );

        Ok(series)
    }
}

/// 기준 위치에 블록을 기록합니다. 같은 기준의 이전 블록은 대체됩니다.
fn store(blocks: &mut [Option<OrderBlock>], active: &mut Vec<usize>, block: OrderBlock) {
    let origin = block.origin_index;
    active.retain(|&o| o != origin);
    active.push(origin);
    blocks[origin] = Some(block);

    trace!(
        origin,
        direction = block.direction.signal(),
        top = %block.top,
        bottom = %block.bottom,
        percentage = %block.percentage,
        "order block formed"
    );
}

/// 돌파 캔들 `trigger` 기준으로 블록을 구성합니다.
///
/// 직전 캔들로 시작해 1..trigger 구간을 훑으며, 강세는 최저 저가(동률이면 나중 캔들),
/// 약세는 최고 고가 캔들을 기준으로 선택합니다.
fn build_block(candles: &CandleSeries, trigger: usize, direction: Direction) -> OrderBlock {
    let rows = candles.candles();
    let seed = trigger - 1;
    let mut bottom = rows[seed].low;
    let mut top = rows[seed].high;
    let mut origin_index = seed;

    for (j, candle) in rows.iter().enumerate().take(trigger).skip(1) {
        let is_new_extreme = match direction {
            Direction::Bullish => candle.low <= bottom,
            Direction::Bearish => candle.high >= top,
        };
        if is_new_extreme {
            bottom = candle.low;
            top = candle.high;
            origin_index = j;
        }
    }

    let current = candles.volume_at(trigger);
    let previous = candles.volume_at(seed);
    let earliest = trigger
        .checked_sub(2)
        .map(|k| candles.volume_at(k))
        .unwrap_or(Decimal::ZERO);

    let (low_volume, high_volume) = match direction {
        Direction::Bullish => (earliest, current + previous),
        Direction::Bearish => (current, earliest),
    };

    OrderBlock {
        direction,
        top,
        bottom,
        volume: current + previous + earliest,
        percentage: strength(low_volume, high_volume),
        origin_index,
        mitigated_index: None,
    }
}

/// 거래량 강도: 100 × min / max, 둘 다 0이면 1.
fn strength(low_volume: Volume, high_volume: Volume) -> Percentage {
    let max = low_volume.max(high_volume);
    if max.is_zero() {
        return Decimal::ONE;
    }
    low_volume.min(high_volume) / max * Decimal::ONE_HUNDRED
}

fn mitigates(candle: &Candle, block: &OrderBlock, close_mitigation: bool) -> bool {
    match block.direction {
        Direction::Bullish => {
            let price = if close_mitigation {
                candle.body_bottom()
            } else {
                candle.low
            };
            price <= block.top
        }
        Direction::Bearish => {
            let price = if close_mitigation {
                candle.body_top()
            } else {
                candle.high
            };
            price >= block.bottom
        }
    }
}
