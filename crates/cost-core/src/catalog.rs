//! 廠區物料價格目錄

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::series::{latest_as_of, Effective};
use crate::{CostError, Result};

/// 廠區物料價格（一筆生效版本）
///
/// 建立後不可變：調價是新增一筆較晚生效日的列，不是更新既有列，
/// 歷史與趨勢查詢因此可行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonePrice {
    /// 物料ID
    pub material_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 生效日期
    pub effective_date: NaiveDate,

    /// 單位價格
    pub price: Decimal,
}

impl ZonePrice {
    /// 創建新的廠區價格
    pub fn new(
        material_id: String,
        zone_id: String,
        effective_date: NaiveDate,
        price: Decimal,
    ) -> Self {
        Self {
            material_id,
            zone_id,
            effective_date,
            price,
        }
    }
}

impl Effective for ZonePrice {
    fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }
}

/// (物料, 廠區) 鍵
pub type MaterialZoneKey = (String, String);

/// 價格寫入通知（快取失效掛鉤）
pub type InvalidationHook = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// 廠區價格目錄
///
/// 每個 (物料, 廠區) 持有一條按生效日排序的序列，以 `Arc` 共享；
/// 寫入以「複製後追加」產生新序列（讀取方持有的快照不受影響），
/// 並觸發已註冊的失效掛鉤。
#[derive(Clone, Default)]
pub struct ZonePriceCatalog {
    series: HashMap<MaterialZoneKey, Arc<Vec<ZonePrice>>>,
    hooks: Vec<InvalidationHook>,
}

impl std::fmt::Debug for ZonePriceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZonePriceCatalog")
            .field("series", &self.series)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl ZonePriceCatalog {
    /// 創建空的價格目錄
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            hooks: Vec::new(),
        }
    }

    /// 註冊價格寫入時的失效掛鉤
    pub fn register_invalidation_hook(&mut self, hook: InvalidationHook) {
        self.hooks.push(hook);
    }

    /// 寫入一筆新價格
    ///
    /// 相同 (物料, 廠區, 生效日) 的重複寫入被拒絕，既有列永不覆蓋。
    pub fn add_price(&mut self, price: ZonePrice) -> Result<()> {
        let key = (price.material_id.clone(), price.zone_id.clone());
        let current = self.series.get(&key);

        if let Some(rows) = current {
            if rows
                .iter()
                .any(|row| row.effective_date == price.effective_date)
            {
                return Err(CostError::DuplicateZonePrice {
                    material_id: price.material_id,
                    zone_id: price.zone_id,
                    effective_date: price.effective_date,
                });
            }
        }

        let mut rows: Vec<ZonePrice> = current.map(|r| r.as_ref().clone()).unwrap_or_default();
        let idx = rows.partition_point(|row| row.effective_date <= price.effective_date);
        let material_id = price.material_id.clone();
        let zone_id = price.zone_id.clone();
        rows.insert(idx, price);
        self.series.insert(key, Arc::new(rows));

        for hook in &self.hooks {
            hook(&material_id, &zone_id);
        }

        Ok(())
    }

    /// 查詢日當下有效的價格
    pub fn price_as_of(
        &self,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<&ZonePrice> {
        self.series
            .get(&(material_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_as_of(rows, as_of))
    }

    /// 取得一致性讀取快照（Arc 淺複製，廉價）
    ///
    /// 一次影響分析內的所有查價走同一份快照，分析期間的調價
    /// 不會造成報告內部不一致。
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            series: self.series.clone(),
        }
    }
}

/// 價格目錄快照（讀取固定，與後續寫入隔離）
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    series: HashMap<MaterialZoneKey, Arc<Vec<ZonePrice>>>,
}

impl CatalogSnapshot {
    /// 查詢日當下有效的價格
    pub fn price_as_of(
        &self,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<&ZonePrice> {
        self.series
            .get(&(material_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_as_of(rows, as_of))
    }

    /// 某 (物料, 廠區) 的完整價格歷史
    pub fn history(&self, material_id: &str, zone_id: &str) -> &[ZonePrice] {
        self.series
            .get(&(material_id.to_string(), zone_id.to_string()))
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn price(material: &str, zone: &str, d: NaiveDate, p: Decimal) -> ZonePrice {
        ZonePrice::new(material.to_string(), zone.to_string(), d, p)
    }

    #[test]
    fn test_price_as_of_resolution() {
        let mut catalog = ZonePriceCatalog::new();
        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(10)))
            .unwrap();
        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 3, 1), dec!(12)))
            .unwrap();

        // 3/1 前查到 1/1 的價
        assert_eq!(
            catalog
                .price_as_of("MAT-CEM", "ZONA-1", date(2025, 2, 15))
                .unwrap()
                .price,
            dec!(10)
        );
        // 3/1 起查到新價
        assert_eq!(
            catalog
                .price_as_of("MAT-CEM", "ZONA-1", date(2025, 3, 1))
                .unwrap()
                .price,
            dec!(12)
        );
        // 第一筆之前查無價格
        assert!(catalog
            .price_as_of("MAT-CEM", "ZONA-1", date(2024, 12, 31))
            .is_none());
        // 不同廠區互不影響
        assert!(catalog
            .price_as_of("MAT-CEM", "ZONA-2", date(2025, 6, 1))
            .is_none());
    }

    #[test]
    fn test_out_of_order_insert_stays_sorted() {
        let mut catalog = ZonePriceCatalog::new();
        catalog
            .add_price(price("MAT-ACE", "ZONA-1", date(2025, 6, 1), dec!(30)))
            .unwrap();
        catalog
            .add_price(price("MAT-ACE", "ZONA-1", date(2025, 1, 1), dec!(25)))
            .unwrap();

        assert_eq!(
            catalog
                .price_as_of("MAT-ACE", "ZONA-1", date(2025, 3, 1))
                .unwrap()
                .price,
            dec!(25)
        );
        assert_eq!(
            catalog
                .price_as_of("MAT-ACE", "ZONA-1", date(2025, 7, 1))
                .unwrap()
                .price,
            dec!(30)
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut catalog = ZonePriceCatalog::new();
        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(10)))
            .unwrap();

        let result = catalog.add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(11)));
        assert!(matches!(result, Err(CostError::DuplicateZonePrice { .. })));

        // 既有列未被覆蓋
        assert_eq!(
            catalog
                .price_as_of("MAT-CEM", "ZONA-1", date(2025, 1, 1))
                .unwrap()
                .price,
            dec!(10)
        );
    }

    #[test]
    fn test_snapshot_isolated_from_later_writes() {
        let mut catalog = ZonePriceCatalog::new();
        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(10)))
            .unwrap();

        let snapshot = catalog.snapshot();

        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 2, 1), dec!(99)))
            .unwrap();

        // 快照仍只看到舊狀態
        assert_eq!(
            snapshot
                .price_as_of("MAT-CEM", "ZONA-1", date(2025, 6, 1))
                .unwrap()
                .price,
            dec!(10)
        );
        // 目錄本身看到新價格
        assert_eq!(
            catalog
                .price_as_of("MAT-CEM", "ZONA-1", date(2025, 6, 1))
                .unwrap()
                .price,
            dec!(99)
        );
    }

    #[test]
    fn test_invalidation_hook_fired_on_write() {
        static FIRED: AtomicUsize = AtomicUsize::new(0);

        let mut catalog = ZonePriceCatalog::new();
        catalog.register_invalidation_hook(Arc::new(|_material, _zone| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        }));

        catalog
            .add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(10)))
            .unwrap();
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);

        // 被拒絕的重複寫入不觸發掛鉤
        let _ = catalog.add_price(price("MAT-CEM", "ZONA-1", date(2025, 1, 1), dec!(11)));
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }
}
