//! 構件配方（BOM）模型與用途反查索引

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::{CostError, Result};

/// 配方行：一個構件對一種物料的單位用量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaLine {
    /// 配方行ID
    pub id: Uuid,

    /// 構件ID
    pub piece_id: String,

    /// 物料ID
    pub material_id: String,

    /// 單位用量（> 0）
    pub quantity_per_unit: Decimal,

    /// 損耗係數（≥ 1.0，乘法損耗）
    pub waste_factor: Decimal,

    /// 是否為可選物料
    pub is_optional: bool,

    /// 備註
    pub notes: Option<String>,
}

impl FormulaLine {
    /// 創建新的配方行
    pub fn new(
        piece_id: String,
        material_id: String,
        quantity_per_unit: Decimal,
        waste_factor: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            piece_id,
            material_id,
            quantity_per_unit,
            waste_factor,
            is_optional: false,
            notes: None,
        }
    }

    /// 建構器模式：設置可選標記
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.is_optional = optional;
        self
    }

    /// 建構器模式：設置備註
    pub fn with_notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// 有效單位耗用 = 單位用量 × 損耗係數
    pub fn effective_consumption(&self) -> Decimal {
        self.quantity_per_unit * self.waste_factor
    }
}

/// 配方驗證結果（持久化前的預檢）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// 是否通過
    pub valid: bool,

    /// 錯誤（任一存在即拒絕寫入）
    pub errors: Vec<String>,

    /// 警告（可寫入，但提醒操作員）
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// 創建通過的驗證結果
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 添加錯誤（同時標記為不通過）
    pub fn add_error(&mut self, message: String) {
        self.valid = false;
        self.errors.push(message);
    }

    /// 添加警告
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// 配方庫
///
/// 用途反查索引（物料 → 構件集合）與配方寫入在同一次
/// `&mut self` 變更內維護，不走背景任務。索引一旦落後，
/// 影響分析會漏算構件，屬正確性問題而非效能問題。
#[derive(Debug, Clone, Default)]
pub struct FormulaStore {
    /// 構件 → 配方行（保留插入順序；順序無語義）
    lines: HashMap<String, Vec<FormulaLine>>,

    /// 物料 → 引用它的構件集合
    where_used: HashMap<String, BTreeSet<String>>,
}

impl FormulaStore {
    /// 創建空的配方庫
    pub fn new() -> Self {
        Self {
            lines: HashMap::new(),
            where_used: HashMap::new(),
        }
    }

    /// 驗證單一配方行（持久化前的預檢，不改變狀態）
    ///
    /// 拒絕：非正數用量、損耗係數低於 1.0、同構件重複物料。
    pub fn validate_line(&self, line: &FormulaLine) -> ValidationReport {
        let mut report = ValidationReport::ok();

        if line.quantity_per_unit <= Decimal::ZERO {
            report.add_error(format!(
                "單位用量必須大於 0（物料 {}: {}）",
                line.material_id, line.quantity_per_unit
            ));
        }

        if line.waste_factor < Decimal::ONE {
            report.add_error(format!(
                "損耗係數不得低於 1.0（物料 {}: {}）",
                line.material_id, line.waste_factor
            ));
        }

        let duplicate = self
            .lines
            .get(&line.piece_id)
            .map(|rows| {
                rows.iter()
                    .any(|row| row.material_id == line.material_id && row.id != line.id)
            })
            .unwrap_or(false);
        if duplicate {
            report.add_error(format!(
                "構件 {} 的配方已包含物料 {}",
                line.piece_id, line.material_id
            ));
        }

        if line.is_optional {
            report.add_warning(format!(
                "物料 {} 標記為可選，無價格時不會列入缺價清單",
                line.material_id
            ));
        }

        report
    }

    /// 新增或更新配方行（同一行 id 視為編輯）
    ///
    /// 先驗證後寫入，驗證不過則完全不落地；索引同步更新。
    /// 新行引用構件已有的物料會被驗證擋下，編輯既有行（同 id）
    /// 不受此限。
    pub fn upsert_line(&mut self, line: FormulaLine) -> Result<ValidationReport> {
        let report = self.validate_line(&line);
        if !report.valid {
            return Err(CostError::Validation(report.errors.join("; ")));
        }

        let rows = self.lines.entry(line.piece_id.clone()).or_default();
        let replaced_material = match rows.iter_mut().find(|row| row.id == line.id) {
            Some(existing) => Some(std::mem::replace(existing, line.clone()).material_id),
            None => {
                rows.push(line.clone());
                None
            }
        };

        // 編輯換了物料時清掉舊索引項（每構件物料唯一，可安全移除）
        if let Some(previous) = replaced_material.filter(|m| *m != line.material_id) {
            if let Some(pieces) = self.where_used.get_mut(&previous) {
                pieces.remove(&line.piece_id);
                if pieces.is_empty() {
                    self.where_used.remove(&previous);
                }
            }
        }

        self.where_used
            .entry(line.material_id.clone())
            .or_default()
            .insert(line.piece_id.clone());

        Ok(report)
    }

    /// 自構件配方移除一種物料
    pub fn remove_line(&mut self, piece_id: &str, material_id: &str) -> Result<()> {
        let rows = self
            .lines
            .get_mut(piece_id)
            .ok_or_else(|| CostError::PieceNotFound(piece_id.to_string()))?;

        let before = rows.len();
        rows.retain(|row| row.material_id != material_id);
        if rows.len() == before {
            return Err(CostError::MaterialNotFound(material_id.to_string()));
        }

        if let Some(pieces) = self.where_used.get_mut(material_id) {
            pieces.remove(piece_id);
            if pieces.is_empty() {
                self.where_used.remove(material_id);
            }
        }

        Ok(())
    }

    /// 取得構件的完整配方（可能為空）
    pub fn formula(&self, piece_id: &str) -> &[FormulaLine] {
        self.lines
            .get(piece_id)
            .map(|rows| rows.as_slice())
            .unwrap_or(&[])
    }

    /// 用途反查：引用某物料的所有構件
    pub fn pieces_using(&self, material_id: &str) -> BTreeSet<String> {
        self.where_used
            .get(material_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 配方行總數
    pub fn line_count(&self) -> usize {
        self.lines.values().map(|rows| rows.len()).sum()
    }
}
