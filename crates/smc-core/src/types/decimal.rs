//! 정밀한 가격 계산을 위한 Decimal 타입 별칭.
//!
//! 롤링 최고가/최저가와의 동등 비교가 정확해야 하므로 부동소수점 대신 `Decimal`을 사용합니다.

use rust_decimal::Decimal;

/// 가격 타입 (시가/고가/저가/종가, 레벨).
pub type Price = Decimal;

/// 거래량 타입 (음수 아님).
pub type Volume = Decimal;

/// 퍼센트 타입 (0 ~ 100).
pub type Percentage = Decimal;
