//! 物料調價影響分析
//!
//! 純模擬：回答「若依目前目錄價格發布，每個相依構件的價格
//! 會怎麼變」，過程不寫入台帳。

use chrono::NaiveDate;
use cost_cache::PriceCache;
use cost_core::{
    CatalogSnapshot, CostError, FormulaStore, LedgerSnapshot, PieceMaster, RateTable,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::calculator::CostCalculator;

/// 取消旗標（UI 離開頁面時設置；分析不寫入，取消永遠安全）
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// 創建新的取消旗標
    pub fn new() -> Self {
        Self::default()
    }

    /// 要求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 是否已要求取消
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 單一構件的影響明細
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceImpact {
    /// 構件ID
    pub piece_id: String,

    /// 舊價格 = 計價日當下最新發布價（從未發布為 None，與 0 區分）
    pub old_price: Option<Decimal>,

    /// 新價格 = 依目前目錄重算的總成本（必要物料缺價時為 None）
    pub new_price: Option<Decimal>,

    /// 價差（無舊價或無新價時為 None，不是 0）
    pub delta: Option<Decimal>,

    /// 價差百分比
    pub delta_percent: Option<Decimal>,

    /// 該物料在此構件的貢獻成本
    pub contributed_cost: Option<Decimal>,

    /// 是否有必要物料缺價
    pub no_price: bool,
}

/// 影響分析報告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    /// 物料ID
    pub material_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 計價日
    pub as_of: NaiveDate,

    /// 受影響構件（按 piece_id 排序；結果與計算順序無關）
    pub affected_pieces: Vec<PieceImpact>,

    /// 合計影響（僅含可計價構件的貢獻成本）
    pub total_impact: Decimal,

    /// 警告信息
    pub warnings: Vec<String>,
}

/// 影響分析器
///
/// 建構時取得目錄與台帳快照：一次分析內所有構件對同一份
/// 狀態計價，分析期間的調價不會產生內部不一致的價差。
pub struct ImpactAnalyzer<'a> {
    formulas: &'a FormulaStore,
    pieces: &'a PieceMaster,
    prices: CatalogSnapshot,
    rates: RateTable,
    ledger: LedgerSnapshot,
}

impl<'a> ImpactAnalyzer<'a> {
    /// 創建新的影響分析器
    pub fn new(
        formulas: &'a FormulaStore,
        pieces: &'a PieceMaster,
        prices: CatalogSnapshot,
        rates: RateTable,
        ledger: LedgerSnapshot,
    ) -> Self {
        Self {
            formulas,
            pieces,
            prices,
            rates,
            ledger,
        }
    }

    /// 分析一種物料調價對所有相依構件的影響
    ///
    /// 構件之間無共享可變狀態，經 rayon 的有界執行緒池平行
    /// 展開；`cancel` 在每個構件開工前檢查。查價共用一個
    /// 分析範圍的讀穿快取，被多個構件引用的物料只解析一次。
    pub fn analyze(
        &self,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
        cancel: &CancellationFlag,
    ) -> cost_core::Result<ImpactReport> {
        let piece_ids: Vec<String> = self.formulas.pieces_using(material_id).into_iter().collect();
        tracing::info!(
            "影響分析開始: 物料 {} 廠區 {}，{} 個相依構件",
            material_id,
            zone_id,
            piece_ids.len()
        );
        let start_time = std::time::Instant::now();

        let cache = PriceCache::new(self.prices.clone());
        let impacts: Vec<PieceImpact> = piece_ids
            .par_iter()
            .map(|piece_id| {
                if cancel.is_cancelled() {
                    return Err(CostError::Cancelled);
                }
                self.analyze_piece(&cache, piece_id, material_id, zone_id, as_of)
            })
            .collect::<cost_core::Result<Vec<_>>>()?;

        let mut impacts = impacts;
        impacts.sort_by(|a, b| a.piece_id.cmp(&b.piece_id));

        let total_impact = impacts
            .iter()
            .filter(|impact| !impact.no_price)
            .filter_map(|impact| impact.contributed_cost)
            .sum();

        let warnings = impacts
            .iter()
            .filter(|impact| impact.no_price)
            .map(|impact| {
                format!(
                    "構件 {} 有必要物料缺價，未列入合計影響",
                    impact.piece_id
                )
            })
            .collect();

        let (cache_hits, cache_misses) = cache.stats();
        tracing::info!(
            "影響分析完成: {} 個構件，耗時 {:?}，查價快取 {} 命中 / {} 未命中",
            impacts.len(),
            start_time.elapsed(),
            cache_hits,
            cache_misses
        );

        Ok(ImpactReport {
            material_id: material_id.to_string(),
            zone_id: zone_id.to_string(),
            as_of,
            affected_pieces: impacts,
            total_impact,
            warnings,
        })
    }

    /// 單一構件的新舊價比較
    fn analyze_piece(
        &self,
        cache: &PriceCache,
        piece_id: &str,
        material_id: &str,
        zone_id: &str,
        as_of: NaiveDate,
    ) -> cost_core::Result<PieceImpact> {
        let calculator = CostCalculator::new(self.formulas, self.pieces, cache, &self.rates);
        let breakdown = calculator.compute_price(piece_id, zone_id, as_of)?;

        let old_price = self
            .ledger
            .current_as_of(piece_id, zone_id, as_of)
            .map(|row| row.price);

        let new_price = if breakdown.no_price {
            None
        } else {
            Some(breakdown.total)
        };

        let delta = match (old_price, new_price) {
            (Some(old), Some(new)) => Some(new - old),
            _ => None,
        };
        let delta_percent = match (old_price, delta) {
            (Some(old), Some(diff)) if old != Decimal::ZERO => {
                Some((diff / old * Decimal::ONE_HUNDRED).round_dp(2))
            }
            _ => None,
        };

        let contributed_cost = self
            .formulas
            .formula(piece_id)
            .iter()
            .find(|line| line.material_id == material_id)
            .and_then(|line| calculator.line_cost(line, zone_id, as_of));

        Ok(PieceImpact {
            piece_id: piece_id.to_string(),
            old_price,
            new_price,
            delta,
            delta_percent,
            contributed_cost,
            no_price: breakdown.no_price,
        })
    }
}
