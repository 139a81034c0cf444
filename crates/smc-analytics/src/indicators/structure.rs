//! 구조 돌파 (Break of Structure / Change of Character).
//!
//! 스윙 포인트를 순서대로 누적하면서 최근 4개(p4, p3, p2, p1; p1이 최신)의
//! 라벨 패턴과 레벨 순서로 구조 돌파 후보를 분류합니다.
//!
//! | 이벤트 | 라벨 패턴 (p4→p1) | 레벨 조건 |
//! |---|---|---|
//! | 강세 BOS | 저 고 저 고 | p4 < p2 < p3 < p1 |
//! | 약세 BOS | 고 저 고 저 | p4 > p2 > p3 > p1 |
//! | 강세 CHoCH | 저 고 저 고 | p1 > p3 > p4 > p2 |
//! | 약세 CHoCH | 고 저 고 저 | p1 < p3 < p4 < p2 |
//!
//! 이벤트 레벨은 p3의 레벨이며, 이벤트는 p3 위치(돌파 대상 스윙)에 기록됩니다.
//! 이후 확인 단계에서 레벨을 처음 넘는 캔들을 찾고, 확인되지 않은 이벤트와
//! 나중에 확인된 이벤트에 덮인 이전 이벤트는 제거합니다.

use serde::{Deserialize, Serialize};
use smc_core::{Candle, CandleSeries, Price, StructureConfig};
use tracing::{debug, trace};

use super::{ensure_aligned, Direction, IndicatorResult, SwingPoint, SwingSeries};

/// 구조 돌파 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    /// Break of Structure (추세 지속)
    Bos,
    /// Change of Character (추세 전환)
    Choch,
}

/// 확인된 구조 돌파.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralBreak {
    /// 종류
    pub kind: BreakKind,
    /// 방향
    pub direction: Direction,
    /// 돌파 대상 스윙의 위치
    pub origin_index: usize,
    /// 돌파된 가격 레벨
    pub level: Price,
    /// 레벨을 처음 넘은 캔들 위치 (항상 origin_index + 1보다 큼)
    pub broken_index: usize,
}

/// 구조 돌파 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureParams {
    /// true면 종가, false면 고가/저가로 돌파 판정 (기본: true).
    pub close_break: bool,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self { close_break: true }
    }
}

impl From<&StructureConfig> for StructureParams {
    fn from(config: &StructureConfig) -> Self {
        Self {
            close_break: config.close_break,
        }
    }
}

/// 캔들 위치와 1:1로 정렬된 구조 돌파 테이블.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureSeries {
    breaks: Vec<Option<StructuralBreak>>,
}

impl StructureSeries {
    /// 위치 개수.
    pub fn len(&self) -> usize {
        self.breaks.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }

    /// 위치 인덱스의 구조 돌파.
    pub fn get(&self, index: usize) -> Option<StructuralBreak> {
        self.breaks.get(index).copied().flatten()
    }

    /// 위치별 전체 테이블.
    pub fn breaks(&self) -> &[Option<StructuralBreak>] {
        &self.breaks
    }

    /// 확인된 이벤트만 순회합니다.
    pub fn events(&self) -> impl Iterator<Item = StructuralBreak> + '_ {
        self.breaks.iter().flatten().copied()
    }

    /// BOS 개수.
    pub fn bos_count(&self) -> usize {
        self.events().filter(|b| b.kind == BreakKind::Bos).count()
    }

    /// CHoCH 개수.
    pub fn choch_count(&self) -> usize {
        self.events().filter(|b| b.kind == BreakKind::Choch).count()
    }
}

/// 확인 전 후보 이벤트.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    kind: BreakKind,
    direction: Direction,
    level: Price,
    broken_index: Option<usize>,
}

/// 구조 돌파 감지기.
#[derive(Debug, Default)]
pub struct MarketStructureDetector;

impl MarketStructureDetector {
    /// 새로운 구조 돌파 감지기 생성.
    pub fn new() -> Self {
        Self
    }

    /// BOS/CHoCH 계산.
    ///
    /// # 인자
    /// * `candles` - 캔들 시퀀스
    /// * `swings` - 같은 시퀀스의 스윙 테이블
    /// * `params` - 돌파 판정 방식
    ///
    /// # 반환
    /// 확인(돌파)된 이벤트만 담은 위치별 테이블. 스윙이 4개 미만이면 모두 `None`.
    pub fn detect(
        &self,
        candles: &CandleSeries,
        swings: &SwingSeries,
        params: StructureParams,
    ) -> IndicatorResult<StructureSeries> {
        ensure_aligned(candles, swings)?;

        // 호출마다 독립적인 작업 배열
        let mut candidates = collect_candidates(swings);
        resolve(candles.candles(), &mut candidates, params.close_break);

        let breaks: Vec<Option<StructuralBreak>> = candidates
            .iter()
            .enumerate()
            .map(|(origin_index, slot)| {
                slot.and_then(|c| {
                    c.broken_index.map(|broken_index| StructuralBreak {
                        kind: c.kind,
                        direction: c.direction,
                        origin_index,
                        level: c.level,
                        broken_index,
                    })
                })
            })
            .collect();

        let series = StructureSeries { breaks };
        debug!(
            candles = candles.len(),
            bos = series.bos_count(),
            choch = series.choch_count(),
            close_break = params.close_break,
            "structure break detection complete"
        );

        Ok(series)
    }
}

/// 스윙 순서를 따라가며 후보 이벤트를 원점(p3) 위치에 기록합니다.
fn collect_candidates(swings: &SwingSeries) -> Vec<Option<Candidate>> {
    let mut candidates: Vec<Option<Candidate>> = vec![None; swings.len()];
    let mut order: Vec<(usize, SwingPoint)> = Vec::new();

    for event in swings.events() {
        order.push(event);
        if let [p4, p3, p2, p1] = &order[order.len().saturating_sub(4)..] {
            candidates[p3.0] = classify(p4.1, p3.1, p2.1, p1.1).map(|(kind, direction)| Candidate {
                kind,
                direction,
                level: p3.1.level,
                broken_index: None,
            });
        }
    }

    candidates
}

/// 4점 패턴 분류. 검사 순서상 뒤의 조건이 앞의 결과를 덮어씁니다.
fn classify(
    p4: SwingPoint,
    p3: SwingPoint,
    p2: SwingPoint,
    p1: SwingPoint,
) -> Option<(BreakKind, Direction)> {
    let bullish_pattern =
        p4.label.is_low() && p3.label.is_high() && p2.label.is_low() && p1.label.is_high();
    let bearish_pattern =
        p4.label.is_high() && p3.label.is_low() && p2.label.is_high() && p1.label.is_low();
    let (l4, l3, l2, l1) = (p4.level, p3.level, p2.level, p1.level);

    let mut result = None;
    if bullish_pattern && l4 < l2 && l2 < l3 && l3 < l1 {
        result = Some((BreakKind::Bos, Direction::Bullish));
    }
    if bearish_pattern && l4 > l2 && l2 > l3 && l3 > l1 {
        result = Some((BreakKind::Bos, Direction::Bearish));
    }
    if bullish_pattern && l1 > l3 && l3 > l4 && l4 > l2 {
        result = Some((BreakKind::Choch, Direction::Bullish));
    }
    if bearish_pattern && l1 < l3 && l3 < l4 && l4 < l2 {
        result = Some((BreakKind::Choch, Direction::Bearish));
    }
    result
}

fn crosses(candle: &Candle, direction: Direction, level: Price, close_break: bool) -> bool {
    match direction {
        Direction::Bullish => {
            let price = if close_break { candle.close } else { candle.high };
            price > level
        }
        Direction::Bearish => {
            let price = if close_break { candle.close } else { candle.low };
            price < level
        }
    }
}

/// 후보별 돌파 캔들을 찾고, 덮인 이전 후보와 미확인 후보를 제거합니다.
fn resolve(candles: &[Candle], candidates: &mut [Option<Candidate>], close_break: bool) {
    for origin in 0..candidates.len() {
        let Some(candidate) = candidates[origin] else {
            continue;
        };

        let broken = (origin + 2..candles.len())
            .find(|&k| crosses(&candles[k], candidate.direction, candidate.level, close_break));

        let Some(broken_index) = broken else {
            // 끝까지 돌파되지 않으면 이벤트가 아님
            candidates[origin] = None;
            continue;
        };

        candidates[origin] = Some(Candidate {
            broken_index: Some(broken_index),
            ..candidate
        });
        trace!(
            origin,
            broken_index,
            level = %candidate.level,
            kind = ?candidate.kind,
            direction = candidate.direction.signal(),
            "structure break confirmed"
        );

        for earlier in candidates[..origin].iter_mut() {
            if earlier
                .and_then(|c| c.broken_index)
                .is_some_and(|earlier_broken| earlier_broken >= broken_index)
            {
                *earlier = None;
            }
        }
    }
}
