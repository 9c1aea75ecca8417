//! 構件模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 構件（預鑄件）
///
/// 技術屬性（單重、含鋼量）供製程與人工小計查表使用，
/// 物料用量放在 FormulaStore。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    /// 構件ID
    pub id: String,

    /// 構件名稱
    pub name: String,

    /// 構件代碼
    pub code: String,

    /// 計量單位代碼
    pub unit_code: String,

    /// 單位重量（噸/單位）
    pub weight_per_unit: Decimal,

    /// 單位含鋼量（kg/單位）
    pub steel_kg_per_unit: Decimal,
}

impl Piece {
    /// 創建新的構件
    pub fn new(id: String, name: String, code: String) -> Self {
        Self {
            id,
            name,
            code,
            unit_code: "un".to_string(),
            weight_per_unit: Decimal::ZERO,
            steel_kg_per_unit: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置計量單位代碼
    pub fn with_unit_code(mut self, unit_code: String) -> Self {
        self.unit_code = unit_code;
        self
    }

    /// 建構器模式：設置單位重量（噸）
    pub fn with_weight_per_unit(mut self, weight: Decimal) -> Self {
        self.weight_per_unit = weight;
        self
    }

    /// 建構器模式：設置單位含鋼量（kg）
    pub fn with_steel_kg_per_unit(mut self, steel_kg: Decimal) -> Self {
        self.steel_kg_per_unit = steel_kg;
        self
    }
}

/// 構件主檔
#[derive(Debug, Clone, Default)]
pub struct PieceMaster {
    pieces: HashMap<String, Piece>,
}

impl PieceMaster {
    /// 創建空的構件主檔
    pub fn new() -> Self {
        Self {
            pieces: HashMap::new(),
        }
    }

    /// 新增或更新構件
    pub fn upsert(&mut self, piece: Piece) {
        self.pieces.insert(piece.id.clone(), piece);
    }

    /// 取得構件
    pub fn get(&self, piece_id: &str) -> Option<&Piece> {
        self.pieces.get(piece_id)
    }

    /// 檢查構件是否存在
    pub fn contains(&self, piece_id: &str) -> bool {
        self.pieces.contains_key(piece_id)
    }

    /// 構件數量
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// 是否為空
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
