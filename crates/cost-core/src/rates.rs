//! 廠區工費與製程費率表
//!
//! 費率是外部維護的查表資料，成本計算只讀不算。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 廠區費率
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRates {
    /// 廠區ID
    pub zone_id: String,

    /// 製程費率（每噸）
    pub process_rate_per_ton: Decimal,

    /// 混凝土人工費率（每噸）
    pub labor_rate_concrete_per_ton: Decimal,

    /// 鋼筋人工費率（每 kg）
    pub labor_rate_steel_per_kg: Decimal,
}

impl ZoneRates {
    /// 創建新的廠區費率
    pub fn new(zone_id: String) -> Self {
        Self {
            zone_id,
            process_rate_per_ton: Decimal::ZERO,
            labor_rate_concrete_per_ton: Decimal::ZERO,
            labor_rate_steel_per_kg: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置製程費率
    pub fn with_process_rate_per_ton(mut self, rate: Decimal) -> Self {
        self.process_rate_per_ton = rate;
        self
    }

    /// 建構器模式：設置混凝土人工費率
    pub fn with_labor_rate_concrete_per_ton(mut self, rate: Decimal) -> Self {
        self.labor_rate_concrete_per_ton = rate;
        self
    }

    /// 建構器模式：設置鋼筋人工費率
    pub fn with_labor_rate_steel_per_kg(mut self, rate: Decimal) -> Self {
        self.labor_rate_steel_per_kg = rate;
        self
    }
}

/// 費率表
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<String, ZoneRates>,
}

impl RateTable {
    /// 創建空的費率表
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// 設置廠區費率
    pub fn upsert(&mut self, rates: ZoneRates) {
        self.rates.insert(rates.zone_id.clone(), rates);
    }

    /// 查詢廠區費率
    pub fn get(&self, zone_id: &str) -> Option<&ZoneRates> {
        self.rates.get(zone_id)
    }

    /// 取得快照（整表複製；費率表很小）
    pub fn snapshot(&self) -> RateTable {
        self.clone()
    }
}
