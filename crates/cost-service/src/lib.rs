//! # Cost Service
//!
//! 服務邊界：每個端點一組帶標記的請求/回應結構，欄位在進入
//! 計算引擎前於邊界驗證完畢，不讓鬆散的 JSON 形狀滲入核心。

pub mod dto;
pub mod service;

// Re-export 主要類型
pub use dto::{
    BreakdownDto, ComparisonDto, FormulaLineRequest, ImpactRequest, ImpactResponse,
    PiecePriceRequest, PiecePriceResponse, PriceUpdateDto, PublishRequest, PublishResponse,
    WhereUsedRequest, WhereUsedResponse,
};
pub use service::{CostService, ServiceConfig};
