//! # PieceCost
//!
//! 預鑄構件成本滾算與物料調價影響傳播引擎
//!
//! - `cost-core`：資料模型、store 與生效日期解析
//! - `cost-calc`：成本計算、用途反查、影響分析、趨勢比較、價格發布
//! - `cost-cache`：請求範圍的查價快取
//! - `cost-service`：端點邊界（請求/回應結構與驗證）

pub use cost_cache::PriceCache;
pub use cost_calc::{
    CancellationFlag, Comparison, ComparisonEngine, CostBreakdown, CostCalculator,
    ImpactAnalyzer, ImpactReport, PricePublisher, Trend,
};
pub use cost_core::{
    CostError, FormulaLine, FormulaStore, Material, MaterialCatalog, Piece, PieceMaster,
    PriceLedger, PublishedPiecePrice, RateTable, Result, ZonePrice, ZonePriceCatalog, ZoneRates,
};
pub use cost_service::{CostService, ServiceConfig};
