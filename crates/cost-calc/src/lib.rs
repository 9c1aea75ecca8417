//! # Cost Calculation Engine
//!
//! 構件成本滾算與物料調價影響傳播引擎

pub mod calculator;
pub mod comparison;
pub mod impact;
pub mod publisher;
pub mod where_used;

// Re-export 主要類型
pub use calculator::CostCalculator;
pub use comparison::{Comparison, ComparisonEngine, Trend};
pub use impact::{CancellationFlag, ImpactAnalyzer, ImpactReport, PieceImpact};
pub use publisher::PricePublisher;
pub use where_used::{WhereUsedEntry, WhereUsedReport};

use rust_decimal::Decimal;

/// 成本明細（派生結果，不落地；發布時另存快照）
///
/// `no_price` 與 `missing_materials` 是回應資料而非錯誤：
/// 部分缺價時仍回傳已計價行的合計，由呼叫端決定怎麼呈現。
/// 「價格為零因為物料免費」與「價格不完整因為缺資料」
/// 必須可區分，缺價永遠不以 0 矇混。
#[derive(Debug, Clone)]
pub struct CostBreakdown {
    /// 構件ID
    pub piece_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 計價日
    pub as_of: chrono::NaiveDate,

    /// 物料小計（僅含已計價行）
    pub materials: Decimal,

    /// 製程小計（每噸費率 × 單重）
    pub process_per_ton: Decimal,

    /// 混凝土人工小計
    pub labor_concrete: Decimal,

    /// 鋼筋人工小計
    pub labor_steel: Decimal,

    /// 總計
    pub total: Decimal,

    /// 是否有必要物料缺價
    pub no_price: bool,

    /// 缺價的物料ID（僅必要物料；可選物料缺價只進 warnings）
    pub missing_materials: Vec<String>,

    /// 警告信息
    pub warnings: Vec<String>,
}

impl CostBreakdown {
    /// 創建空的成本明細
    pub fn empty(piece_id: String, zone_id: String, as_of: chrono::NaiveDate) -> Self {
        Self {
            piece_id,
            zone_id,
            as_of,
            materials: Decimal::ZERO,
            process_per_ton: Decimal::ZERO,
            labor_concrete: Decimal::ZERO,
            labor_steel: Decimal::ZERO,
            total: Decimal::ZERO,
            no_price: false,
            missing_materials: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// 記錄一筆必要物料缺價
    pub fn mark_missing(&mut self, material_id: String) {
        self.no_price = true;
        self.missing_materials.push(material_id);
    }

    /// 轉為發布用的明細快照
    pub fn snapshot(&self) -> cost_core::BreakdownSnapshot {
        cost_core::BreakdownSnapshot {
            materials: self.materials,
            process_per_ton: self.process_per_ton,
            labor_concrete: self.labor_concrete,
            labor_steel: self.labor_steel,
            total: self.total,
        }
    }
}
