//! 物料模型

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 物料（僅身份資訊；價格在 ZonePriceCatalog、用量在 FormulaStore）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// 物料ID
    pub id: String,

    /// 物料代碼
    pub code: String,

    /// 物料名稱
    pub name: String,

    /// 類別（水泥、鋼筋、骨材...）
    pub category: String,

    /// 計量單位（kg、m3、un...）
    pub unit_of_measure: String,
}

impl Material {
    /// 創建新的物料
    pub fn new(id: String, code: String, name: String) -> Self {
        Self {
            id,
            code,
            name,
            category: String::new(),
            unit_of_measure: String::new(),
        }
    }

    /// 建構器模式：設置類別
    pub fn with_category(mut self, category: String) -> Self {
        self.category = category;
        self
    }

    /// 建構器模式：設置計量單位
    pub fn with_unit_of_measure(mut self, uom: String) -> Self {
        self.unit_of_measure = uom;
        self
    }
}

/// 物料主檔
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    materials: HashMap<String, Material>,
}

impl MaterialCatalog {
    /// 創建空的物料主檔
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// 新增或更新物料
    pub fn upsert(&mut self, material: Material) {
        self.materials.insert(material.id.clone(), material);
    }

    /// 取得物料
    pub fn get(&self, material_id: &str) -> Option<&Material> {
        self.materials.get(material_id)
    }

    /// 檢查物料是否存在
    pub fn contains(&self, material_id: &str) -> bool {
        self.materials.contains_key(material_id)
    }

    /// 物料數量
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// 是否為空
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
