//! 物料用途反查報表

use chrono::NaiveDate;
use cost_cache::PriceCache;
use cost_core::{
    CatalogSnapshot, CostError, FormulaStore, LedgerSnapshot, PieceMaster, RateTable,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::CostCalculator;

/// 用途反查報表的一列（一個引用該物料的構件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereUsedEntry {
    /// 構件ID
    pub piece_id: String,

    /// 構件名稱
    pub piece_name: String,

    /// 構件代碼
    pub piece_code: String,

    /// 計量單位代碼
    pub unit_code: String,

    /// 單位用量
    pub quantity_per_unit: Decimal,

    /// 損耗係數
    pub waste_factor: Decimal,

    /// 有效單位耗用
    pub effective_consumption: Decimal,

    /// 該物料貢獻的成本（缺價時為 None）
    pub contributed_cost: Option<Decimal>,

    /// 佔構件總成本的百分比
    pub participation_percent: Option<Decimal>,

    /// 目前發布價格（未發布過為 None）
    pub published_price: Option<Decimal>,

    /// 構件的物料總成本
    pub total_material_cost: Decimal,

    /// 該構件是否有必要物料缺價
    pub no_price: bool,
}

/// 用途反查報表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereUsedReport {
    /// 物料ID
    pub material_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 計價日
    pub as_of: NaiveDate,

    /// 該物料於計價日的有效價格（無則為 None）
    pub material_price: Option<Decimal>,

    /// 受影響構件數
    pub total_pieces: usize,

    /// 合計影響（已計價構件的貢獻成本總和）
    pub total_impact: Decimal,

    /// 各構件明細
    pub affected_pieces: Vec<WhereUsedEntry>,

    /// 警告信息
    pub warnings: Vec<String>,
}

/// 產生物料用途反查報表
///
/// 對 `pieces_using(material)` 的每個構件跑一次成本計算，
/// 導出該物料自身的貢獻成本與參與百分比。查價走單次報表
/// 範圍的讀穿快取，同一物料跨構件重複出現不會重複打目錄。
pub fn where_used_report(
    formulas: &FormulaStore,
    pieces: &PieceMaster,
    prices: &CatalogSnapshot,
    rates: &RateTable,
    ledger: &LedgerSnapshot,
    material_id: &str,
    zone_id: &str,
    as_of: NaiveDate,
) -> cost_core::Result<WhereUsedReport> {
    let piece_ids = formulas.pieces_using(material_id);
    tracing::info!(
        "用途反查: 物料 {} 廠區 {} 計價日 {}，{} 個構件",
        material_id,
        zone_id,
        as_of,
        piece_ids.len()
    );

    let cache = PriceCache::new(prices.clone());
    let material_price = cache.price_as_of(material_id, zone_id, as_of);

    let calculator = CostCalculator::new(formulas, pieces, &cache, rates);
    let mut entries = Vec::with_capacity(piece_ids.len());
    let mut total_impact = Decimal::ZERO;
    let mut warnings = Vec::new();

    for piece_id in &piece_ids {
        let piece = pieces
            .get(piece_id)
            .ok_or_else(|| CostError::PieceNotFound(piece_id.clone()))?;

        let line = formulas
            .formula(piece_id)
            .iter()
            .find(|row| row.material_id == material_id)
            .cloned()
            .ok_or_else(|| {
                // 索引與配方由同一次寫入維護，不一致代表 store 被繞過
                CostError::CalculationError(format!(
                    "用途索引含構件 {} 但配方無物料 {}",
                    piece_id, material_id
                ))
            })?;

        let breakdown = calculator.compute_price(piece_id, zone_id, as_of)?;
        let contributed = calculator.line_cost(&line, zone_id, as_of);

        match contributed {
            Some(cost) => total_impact += cost,
            None => warnings.push(format!(
                "構件 {} 的物料 {} 缺價，未列入合計影響",
                piece_id, material_id
            )),
        }

        let participation = contributed.and_then(|cost| {
            if breakdown.total == Decimal::ZERO {
                None
            } else {
                Some((cost / breakdown.total * Decimal::ONE_HUNDRED).round_dp(2))
            }
        });

        entries.push(WhereUsedEntry {
            piece_id: piece_id.clone(),
            piece_name: piece.name.clone(),
            piece_code: piece.code.clone(),
            unit_code: piece.unit_code.clone(),
            quantity_per_unit: line.quantity_per_unit,
            waste_factor: line.waste_factor,
            effective_consumption: line.effective_consumption(),
            contributed_cost: contributed,
            participation_percent: participation,
            published_price: ledger
                .current_as_of(piece_id, zone_id, as_of)
                .map(|row| row.price),
            total_material_cost: breakdown.materials,
            no_price: breakdown.no_price,
        });
    }

    Ok(WhereUsedReport {
        material_id: material_id.to_string(),
        zone_id: zone_id.to_string(),
        as_of,
        material_price,
        total_pieces: entries.len(),
        total_impact,
        affected_pieces: entries,
        warnings,
    })
}
