//! 請求範圍的讀穿式查價快取
//!
//! 以 (物料, 廠區, 計價日) 為鍵，生命週期綁定單一請求；
//! 不做行程全域的無界快取。目錄寫入時經由失效掛鉤清空，
//! 負查詢（查無價格）同樣被快取，缺價構件不會反覆打目錄。

use chrono::NaiveDate;
use cost_core::CatalogSnapshot;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

type CacheKey = (String, String, NaiveDate);

/// 查價快取
pub struct PriceCache {
    snapshot: CatalogSnapshot,
    entries: Mutex<HashMap<CacheKey, Option<Decimal>>>,
    hits: Mutex<u64>,
    misses: Mutex<u64>,
}

impl PriceCache {
    /// 以一份目錄快照建立快取
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            entries: Mutex::new(HashMap::new()),
            hits: Mutex::new(0),
            misses: Mutex::new(0),
        }
    }

    /// 讀穿式查價：先查快取，未命中再查快照並回填
    pub fn price_as_of(
        &self,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<Decimal> {
        let key = (material_id.to_string(), zone_id.to_string(), as_of);

        if let Some(cached) = self.entries.lock().unwrap().get(&key) {
            *self.hits.lock().unwrap() += 1;
            return *cached;
        }

        *self.misses.lock().unwrap() += 1;
        let resolved = self
            .snapshot
            .price_as_of(material_id, zone_id, as_of)
            .map(|row| row.price);
        self.entries.lock().unwrap().insert(key, resolved);
        resolved
    }

    /// 使某物料的所有快取項失效（目錄寫入掛鉤呼叫）
    pub fn invalidate_material(&self, material_id: &str) {
        self.entries
            .lock()
            .unwrap()
            .retain(|(cached_material, _, _), _| cached_material != material_id);
    }

    /// 清空整個快取
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// 命中/未命中統計
    pub fn stats(&self) -> (u64, u64) {
        (*self.hits.lock().unwrap(), *self.misses.lock().unwrap())
    }
}
