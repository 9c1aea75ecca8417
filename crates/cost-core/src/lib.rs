//! # Cost Core
//!
//! 核心資料模型與類型定義

pub mod catalog;
pub mod formula;
pub mod ledger;
pub mod material;
pub mod piece;
pub mod rates;
pub mod series;

// Re-export 主要類型
pub use catalog::{CatalogSnapshot, InvalidationHook, ZonePrice, ZonePriceCatalog};
pub use formula::{FormulaLine, FormulaStore, ValidationReport};
pub use ledger::{BreakdownSnapshot, LedgerSnapshot, PriceLedger, PublishedPiecePrice};
pub use material::{Material, MaterialCatalog};
pub use piece::{Piece, PieceMaster};
pub use rates::{RateTable, ZoneRates};
pub use series::{latest_as_of, latest_before, Effective};

/// 成本引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum CostError {
    #[error("找不到構件: {0}")]
    PieceNotFound(String),

    #[error("找不到物料: {0}")]
    MaterialNotFound(String),

    #[error("驗證失敗: {0}")]
    Validation(String),

    #[error("發布衝突: 構件 {piece_id} 廠區 {zone_id} 生效日 {effective_date} 已存在價格")]
    PublishConflict {
        piece_id: String,
        zone_id: String,
        effective_date: chrono::NaiveDate,
    },

    #[error("價格重複: 物料 {material_id} 廠區 {zone_id} 生效日 {effective_date} 已存在")]
    DuplicateZonePrice {
        material_id: String,
        zone_id: String,
        effective_date: chrono::NaiveDate,
    },

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("計算已取消")]
    Cancelled,

    #[error("計算錯誤: {0}")]
    CalculationError(String),
}

pub type Result<T> = std::result::Result<T, CostError>;
