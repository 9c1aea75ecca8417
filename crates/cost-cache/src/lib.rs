//! # Cost Cache
//!
//! 請求範圍的查價快取

pub mod price_cache;

// Re-export 主要類型
pub use price_cache::PriceCache;
