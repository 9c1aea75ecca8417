//! 構件價格發布

use chrono::NaiveDate;
use cost_core::{PriceLedger, PublishedPiecePrice};
use rust_decimal::Decimal;

use crate::CostBreakdown;

/// 價格發布器
///
/// 台帳規則（價格 > 0、禁止回溯、同鍵衝突）由 `PriceLedger`
/// 強制；這裡負責組裝台帳列並附上發布當下的明細快照。
pub struct PricePublisher {
    /// 發布人（記入每筆台帳列）
    published_by: String,
}

impl PricePublisher {
    /// 創建新的發布器
    pub fn new(published_by: String) -> Self {
        Self { published_by }
    }

    /// 發布一筆構件價格
    pub fn publish(
        &self,
        ledger: &mut PriceLedger,
        piece_id: &str,
        zone_id: &str,
        effective_date: NaiveDate,
        price: Decimal,
    ) -> cost_core::Result<PublishedPiecePrice> {
        let entry = PublishedPiecePrice::new(
            piece_id.to_string(),
            zone_id.to_string(),
            effective_date,
            price,
            self.published_by.clone(),
        );
        let published = ledger.append(entry)?;
        tracing::info!(
            "發布價格: 構件 {} 廠區 {} 生效日 {} 價格 {}",
            piece_id,
            zone_id,
            effective_date,
            price
        );
        Ok(published)
    }

    /// 發布並附上計算當下的明細快照
    pub fn publish_with_breakdown(
        &self,
        ledger: &mut PriceLedger,
        breakdown: &CostBreakdown,
        effective_date: NaiveDate,
        price: Decimal,
    ) -> cost_core::Result<PublishedPiecePrice> {
        let entry = PublishedPiecePrice::new(
            breakdown.piece_id.clone(),
            breakdown.zone_id.clone(),
            effective_date,
            price,
            self.published_by.clone(),
        )
        .with_breakdown(breakdown.snapshot());
        ledger.append(entry)
    }
}
