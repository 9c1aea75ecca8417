//! 生效日期序列解析
//!
//! 「查詢日當下有效的那一筆 = effective_date ≤ 查詢日的最新一筆」
//! 這條規則在整個引擎只有這裡一份實作，成本計算、趨勢比較、
//! 價格發布共用，避免三份漂移的複本。

use chrono::NaiveDate;

/// 具有生效日期的資料列
pub trait Effective {
    /// 生效日期
    fn effective_date(&self) -> NaiveDate;
}

/// 查詢日當下有效的一筆（effective_date ≤ as_of 的最新列）
///
/// 前提：`rows` 已按生效日期遞增排序（各 store 在寫入時維護）。
pub fn latest_as_of<T: Effective>(rows: &[T], as_of: NaiveDate) -> Option<&T> {
    let idx = rows.partition_point(|row| row.effective_date() <= as_of);
    if idx == 0 {
        None
    } else {
        rows.get(idx - 1)
    }
}

/// 嚴格早於查詢日的最新一筆（趨勢比較用：排除同日發布）
pub fn latest_before<T: Effective>(rows: &[T], before: NaiveDate) -> Option<&T> {
    let idx = rows.partition_point(|row| row.effective_date() < before);
    if idx == 0 {
        None
    } else {
        rows.get(idx - 1)
    }
}
