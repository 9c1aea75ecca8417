//! 構件發布價格台帳
//!
//! 只追加（append-only）：既有列永不更新，只能被較晚生效日的
//! 新列取代。歷史因此永遠可查，供趨勢圖使用。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::series::{latest_as_of, latest_before, Effective};
use crate::{CostError, Result};

/// 發布時的成本明細快照（固定在發布當下，不隨目錄變動）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownSnapshot {
    /// 物料小計
    pub materials: Decimal,

    /// 製程小計（每噸）
    pub process_per_ton: Decimal,

    /// 混凝土人工小計
    pub labor_concrete: Decimal,

    /// 鋼筋人工小計
    pub labor_steel: Decimal,

    /// 總計
    pub total: Decimal,
}

/// 構件發布價格（台帳列）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPiecePrice {
    /// 台帳列ID
    pub id: Uuid,

    /// 構件ID
    pub piece_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 生效日期
    pub effective_date: NaiveDate,

    /// 發布價格
    pub price: Decimal,

    /// 發布當下的成本明細快照
    pub breakdown: Option<BreakdownSnapshot>,

    /// 發布人
    pub published_by: String,

    /// 發布時間
    pub published_at: DateTime<Utc>,
}

impl PublishedPiecePrice {
    /// 創建新的台帳列
    pub fn new(
        piece_id: String,
        zone_id: String,
        effective_date: NaiveDate,
        price: Decimal,
        published_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            piece_id,
            zone_id,
            effective_date,
            price,
            breakdown: None,
            published_by,
            published_at: Utc::now(),
        }
    }

    /// 建構器模式：附上明細快照
    pub fn with_breakdown(mut self, breakdown: BreakdownSnapshot) -> Self {
        self.breakdown = Some(breakdown);
        self
    }
}

impl Effective for PublishedPiecePrice {
    fn effective_date(&self) -> NaiveDate {
        self.effective_date
    }
}

/// (構件, 廠區) 鍵
pub type PieceZoneKey = (String, String);

/// 發布價格台帳
#[derive(Debug, Clone, Default)]
pub struct PriceLedger {
    series: HashMap<PieceZoneKey, Arc<Vec<PublishedPiecePrice>>>,
}

impl PriceLedger {
    /// 創建空的台帳
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
        }
    }

    /// 追加一筆發布價格
    ///
    /// 驗證：價格 > 0；生效日不得早於同 (構件, 廠區) 最新一筆
    /// （禁止回溯改寫）；與既有列完全同鍵 → 衝突，後寫者落敗。
    pub fn append(&mut self, entry: PublishedPiecePrice) -> Result<PublishedPiecePrice> {
        if entry.price <= Decimal::ZERO {
            return Err(CostError::Validation(format!(
                "發布價格必須大於 0: {}",
                entry.price
            )));
        }

        let key = (entry.piece_id.clone(), entry.zone_id.clone());
        if let Some(rows) = self.series.get(&key) {
            if rows
                .iter()
                .any(|row| row.effective_date == entry.effective_date)
            {
                return Err(CostError::PublishConflict {
                    piece_id: entry.piece_id,
                    zone_id: entry.zone_id,
                    effective_date: entry.effective_date,
                });
            }

            if let Some(last) = rows.last() {
                if entry.effective_date < last.effective_date {
                    return Err(CostError::Validation(format!(
                        "生效日 {} 早於最新發布 {}，台帳禁止回溯",
                        entry.effective_date, last.effective_date
                    )));
                }
            }
        }

        let mut rows: Vec<PublishedPiecePrice> = self
            .series
            .get(&key)
            .map(|r| r.as_ref().clone())
            .unwrap_or_default();
        rows.push(entry.clone());
        self.series.insert(key, Arc::new(rows));

        Ok(entry)
    }

    /// 查詢日當下有效的發布價格
    pub fn current_as_of(
        &self,
        piece_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<&PublishedPiecePrice> {
        self.series
            .get(&(piece_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_as_of(rows, as_of))
    }

    /// 嚴格早於某日的最新發布（趨勢比較用）
    pub fn latest_before(
        &self,
        piece_id: &str,
        zone_id: &str,
        before: NaiveDate,
    ) -> Option<&PublishedPiecePrice> {
        self.series
            .get(&(piece_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_before(rows, before))
    }

    /// 某 (構件, 廠區) 的完整發布歷史
    pub fn history(&self, piece_id: &str, zone_id: &str) -> &[PublishedPiecePrice] {
        self.series
            .get(&(piece_id.to_string(), zone_id.to_string()))
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    /// 取得一致性讀取快照
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            series: self.series.clone(),
        }
    }
}

/// 台帳快照（讀取固定，與後續發布隔離）
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    series: HashMap<PieceZoneKey, Arc<Vec<PublishedPiecePrice>>>,
}

impl LedgerSnapshot {
    /// 查詢日當下有效的發布價格
    pub fn current_as_of(
        &self,
        piece_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<&PublishedPiecePrice> {
        self.series
            .get(&(piece_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_as_of(rows, as_of))
    }

    /// 嚴格早於某日的最新發布
    pub fn latest_before(
        &self,
        piece_id: &str,
        zone_id: &str,
        before: NaiveDate,
    ) -> Option<&PublishedPiecePrice> {
        self.series
            .get(&(piece_id.to_string(), zone_id.to_string()))
            .and_then(|rows| latest_before(rows, before))
    }
}
