//! 構件成本計算器

use chrono::NaiveDate;
use cost_cache::PriceCache;
use cost_core::{CostError, FormulaStore, PieceMaster, RateTable};
use rust_decimal::Decimal;

use crate::CostBreakdown;

/// 成本計算器
///
/// 對輸入三元組 (構件, 廠區, 計價日) 與建構時注入的快照而言
/// 是純函數：同輸入必同輸出，無副作用。查價一律走請求範圍
/// 的讀穿快取，同一物料在多行/多構件間重複解析只打目錄一次。
pub struct CostCalculator<'a> {
    /// 配方庫
    formulas: &'a FormulaStore,

    /// 構件主檔
    pieces: &'a PieceMaster,

    /// 查價快取（包著一份目錄快照）
    prices: &'a PriceCache,

    /// 費率表
    rates: &'a RateTable,
}

impl<'a> CostCalculator<'a> {
    /// 創建新的成本計算器
    pub fn new(
        formulas: &'a FormulaStore,
        pieces: &'a PieceMaster,
        prices: &'a PriceCache,
        rates: &'a RateTable,
    ) -> Self {
        Self {
            formulas,
            pieces,
            rates,
            prices,
        }
    }

    /// 計算構件在某廠區、某計價日的單位成本明細
    ///
    /// 缺價不是失敗：必要物料缺價的行被標記進 `missing_materials`，
    /// 其餘行照常合計。找不到構件才回傳錯誤。
    pub fn compute_price(
        &self,
        piece_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> cost_core::Result<CostBreakdown> {
        let piece = self
            .pieces
            .get(piece_id)
            .ok_or_else(|| CostError::PieceNotFound(piece_id.to_string()))?;

        let formula = self.formulas.formula(piece_id);
        tracing::debug!(
            "計算構件成本: {} 廠區 {} 計價日 {} 配方 {} 行",
            piece_id,
            zone_id,
            as_of,
            formula.len()
        );

        let mut breakdown = CostBreakdown::empty(
            piece_id.to_string(),
            zone_id.to_string(),
            as_of,
        );

        if formula.is_empty() {
            // 空配方視為有效（物料小計 0），但提醒呼叫端
            breakdown.add_warning(format!("構件 {} 的配方為空，物料小計為 0", piece_id));
        }

        for line in formula {
            match self.prices.price_as_of(&line.material_id, zone_id, as_of) {
                Some(price) => {
                    breakdown.materials += line.effective_consumption() * price;
                }
                None if line.is_optional => {
                    breakdown.add_warning(format!(
                        "可選物料 {} 於廠區 {} 無 {} 的有效價格，略過",
                        line.material_id, zone_id, as_of
                    ));
                }
                None => {
                    breakdown.mark_missing(line.material_id.clone());
                }
            }
        }

        match self.rates.get(zone_id) {
            Some(rates) => {
                breakdown.process_per_ton = piece.weight_per_unit * rates.process_rate_per_ton;
                breakdown.labor_concrete =
                    piece.weight_per_unit * rates.labor_rate_concrete_per_ton;
                breakdown.labor_steel = piece.steel_kg_per_unit * rates.labor_rate_steel_per_kg;
            }
            None => {
                breakdown.add_warning(format!(
                    "廠區 {} 未設定費率，製程與人工小計為 0",
                    zone_id
                ));
            }
        }

        breakdown.total = breakdown.materials
            + breakdown.process_per_ton
            + breakdown.labor_concrete
            + breakdown.labor_steel;

        if breakdown.no_price {
            breakdown.add_warning(format!(
                "構件 {} 有 {} 項必要物料缺價，總計僅含已計價部分",
                piece_id,
                breakdown.missing_materials.len()
            ));
        }

        Ok(breakdown)
    }

    /// 單一配方行在 (廠區, 計價日) 下貢獻的物料成本
    pub fn line_cost(
        &self,
        line: &cost_core::FormulaLine,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> Option<Decimal> {
        self.prices
            .price_as_of(&line.material_id, zone_id, as_of)
            .map(|price| line.effective_consumption() * price)
    }
}
