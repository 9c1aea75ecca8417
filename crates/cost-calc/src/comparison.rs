//! 價格趨勢比較

use chrono::NaiveDate;
use cost_core::LedgerSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 趨勢方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// 上漲
    Up,
    /// 下跌
    Down,
    /// 持平（|delta| < epsilon）
    Flat,
}

/// 比較結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// 趨勢
    pub trend: Trend,

    /// 變動百分比（基準為 0 時無法定義，為 None）
    pub delta_percent: Option<Decimal>,

    /// 比較基準（前一筆發布價格）
    pub previous_price: Decimal,
}

/// 趨勢比較引擎
///
/// 基準是嚴格早於計價日的最新發布；沒有前價時比較結果是
/// None，不是 Flat（「無前價」與「持平」是兩種狀態）。
pub struct ComparisonEngine {
    /// 持平判定閾值（百分比）；用閾值而非 == 0 以免噪音
    epsilon_percent: Decimal,
}

impl ComparisonEngine {
    /// 創建比較引擎（預設閾值 0.01%）
    pub fn new() -> Self {
        Self {
            epsilon_percent: Decimal::new(1, 2), // 0.01
        }
    }

    /// 建構器模式：設置持平閾值
    pub fn with_epsilon_percent(mut self, epsilon: Decimal) -> Self {
        self.epsilon_percent = epsilon;
        self
    }

    /// 與前一筆發布價格比較
    pub fn compare(
        &self,
        ledger: &LedgerSnapshot,
        piece_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
        computed_price: Decimal,
    ) -> Option<Comparison> {
        let previous = ledger.latest_before(piece_id, zone_id, as_of)?;
        Some(self.compare_against(previous.price, computed_price))
    }

    /// 與指定基準價比較
    pub fn compare_against(&self, previous: Decimal, current: Decimal) -> Comparison {
        if previous == Decimal::ZERO {
            // 基準為零：百分比無定義，方向由絕對值決定
            let trend = if current > Decimal::ZERO {
                Trend::Up
            } else {
                Trend::Flat
            };
            return Comparison {
                trend,
                delta_percent: None,
                previous_price: previous,
            };
        }

        let delta_percent = (current - previous) / previous * Decimal::ONE_HUNDRED;
        let trend = if delta_percent.abs() < self.epsilon_percent {
            Trend::Flat
        } else if delta_percent > Decimal::ZERO {
            Trend::Up
        } else {
            Trend::Down
        };

        Comparison {
            trend,
            delta_percent: Some(delta_percent.round_dp(2)),
            previous_price: previous,
        }
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new()
    }
}
