//! 端點請求/回應結構
//!
//! 線上欄位名沿用 UI 既有的西文契約（materiales、proceso_por_tn
//! 等），內部型別維持英文命名，以 serde rename 橋接。

use chrono::NaiveDate;
use cost_calc::{Comparison, CostBreakdown, Trend};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 構件計價請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecePriceRequest {
    /// 構件ID
    pub piece_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 計價日
    pub effective_date: NaiveDate,

    /// 是否附帶趨勢比較
    #[serde(default)]
    pub include_comparison: bool,
}

/// 成本明細（線上形狀）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownDto {
    /// 物料小計
    #[serde(rename = "materiales")]
    pub materials: Decimal,

    /// 製程小計
    #[serde(rename = "proceso_por_tn")]
    pub process_per_ton: Decimal,

    /// 混凝土人工小計
    #[serde(rename = "mano_obra_hormigon")]
    pub labor_concrete: Decimal,

    /// 鋼筋人工小計
    #[serde(rename = "mano_obra_acero")]
    pub labor_steel: Decimal,

    /// 總計
    pub total: Decimal,
}

impl BreakdownDto {
    /// 自引擎結果轉換（金額呈現精度 2 位小數）
    pub fn from_breakdown(breakdown: &CostBreakdown) -> Self {
        Self {
            materials: breakdown.materials.round_dp(2),
            process_per_ton: breakdown.process_per_ton.round_dp(2),
            labor_concrete: breakdown.labor_concrete.round_dp(2),
            labor_steel: breakdown.labor_steel.round_dp(2),
            total: breakdown.total.round_dp(2),
        }
    }
}

/// 趨勢比較（線上形狀）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonDto {
    /// 趨勢（up/down/flat）
    pub trend: Trend,

    /// 變動百分比
    pub delta_percent: Option<Decimal>,
}

impl From<&Comparison> for ComparisonDto {
    fn from(comparison: &Comparison) -> Self {
        Self {
            trend: comparison.trend,
            delta_percent: comparison.delta_percent,
        }
    }
}

/// 構件計價回應
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecePriceResponse {
    /// 成本明細
    pub breakdown: BreakdownDto,

    /// 趨勢比較（無前次發布為 null）
    pub comparison: Option<ComparisonDto>,

    /// 是否有必要物料缺價（與「物料免費」區分的專用通道）
    pub no_price: bool,

    /// 缺價物料ID
    pub missing_materials: Vec<String>,

    /// 警告信息
    pub warnings: Vec<String>,
}

/// 用途反查請求（month 格式 "YYYY-MM"）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereUsedRequest {
    /// 物料ID
    pub material_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 查詢月份
    pub month: String,
}

/// 用途反查回應的一列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedPieceDto {
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

    /// 貢獻成本
    pub contributed_cost: Option<Decimal>,

    /// 參與百分比
    pub participation_percent: Option<Decimal>,

    /// 目前發布價格
    pub published_price: Option<Decimal>,

    /// 構件物料總成本
    pub total_material_cost: Decimal,

    /// 該構件是否有必要物料缺價（逐列旗標，不需解析 warnings）
    pub no_price: bool,
}

/// 用途反查回應
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereUsedResponse {
    /// 受影響構件數
    pub total_pieces: usize,

    /// 合計影響
    pub total_impact: Decimal,

    /// 物料於查詢月的有效價格
    pub material_price: Option<Decimal>,

    /// 各構件明細
    pub affected_pieces: Vec<AffectedPieceDto>,

    /// 警告信息
    pub warnings: Vec<String>,
}

/// 影響重算請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRequest {
    /// 物料ID
    pub material_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 查詢月份（"YYYY-MM"）
    pub month: String,
}

/// 單一構件的價格更新預覽
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdateDto {
    /// 構件ID
    pub piece_id: String,

    /// 舊價格（從未發布為 null）
    pub old_price: Option<Decimal>,

    /// 新價格（缺價構件為 null）
    pub new_price: Option<Decimal>,

    /// 價差
    pub delta: Option<Decimal>,

    /// 價差百分比
    pub delta_percent: Option<Decimal>,

    /// 是否缺價
    pub no_price: bool,
}

/// 影響重算回應
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResponse {
    /// 受影響構件數
    pub affected_pieces: usize,

    /// 合計影響
    pub total_impact: Decimal,

    /// 各構件價格更新預覽
    pub price_updates: Vec<PriceUpdateDto>,

    /// 警告信息
    pub warnings: Vec<String>,
}

/// 價格發布請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    /// 構件ID
    pub piece_id: String,

    /// 廠區ID
    pub zone_id: String,

    /// 生效日期
    pub effective_date: NaiveDate,

    /// 發布價格
    pub price: Decimal,

    /// 發布人（會話層注入；缺省記為 sistema）
    #[serde(default = "default_published_by")]
    pub published_by: String,
}

fn default_published_by() -> String {
    "sistema".to_string()
}

/// 價格發布回應
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    /// 是否成功
    pub success: bool,
}

/// 配方行維護請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaLineRequest {
    /// 構件ID
    pub piece_id: String,

    /// 物料ID
    pub material_id: String,

    /// 單位用量
    pub quantity_per_unit: Decimal,

    /// 損耗係數
    pub waste_factor: Decimal,

    /// 是否可選
    #[serde(default)]
    pub is_optional: bool,

    /// 備註
    #[serde(default)]
    pub notes: Option<String>,
}
