//! 端點服務

use chrono::NaiveDate;
use cost_cache::PriceCache;
use cost_calc::{
    where_used, CancellationFlag, ComparisonEngine, CostCalculator, ImpactAnalyzer,
    PricePublisher,
};
use cost_core::{
    CostError, FormulaLine, FormulaStore, Material, MaterialCatalog, Piece, PieceMaster,
    PriceLedger, RateTable, ValidationReport, ZonePrice, ZonePriceCatalog, ZoneRates,
};
use rust_decimal::Decimal;
use std::sync::{Mutex, RwLock};

use crate::dto::*;

/// 服務配置
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 趨勢持平判定閾值（百分比）
    pub epsilon_percent: Decimal,
}

impl ServiceConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            epsilon_percent: Decimal::new(1, 2), // 0.01%
        }
    }

    /// 建構器模式：設置持平閾值
    pub fn with_epsilon_percent(mut self, epsilon: Decimal) -> Self {
        self.epsilon_percent = epsilon;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 成本服務
///
/// 主檔與配方走 RwLock（讀多寫少），台帳走 Mutex：發布的
/// 衝突檢查與追加必須在同一臨界區內完成。
pub struct CostService {
    formulas: RwLock<FormulaStore>,
    pieces: RwLock<PieceMaster>,
    materials: RwLock<MaterialCatalog>,
    catalog: RwLock<ZonePriceCatalog>,
    rates: RwLock<RateTable>,
    ledger: Mutex<PriceLedger>,
    config: ServiceConfig,
}

impl CostService {
    /// 創建空的服務
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            formulas: RwLock::new(FormulaStore::new()),
            pieces: RwLock::new(PieceMaster::new()),
            materials: RwLock::new(MaterialCatalog::new()),
            catalog: RwLock::new(ZonePriceCatalog::new()),
            rates: RwLock::new(RateTable::new()),
            ledger: Mutex::new(PriceLedger::new()),
            config,
        }
    }

    // ---- 主檔維護（簡單 CRUD，包核心 store）----

    /// 新增或更新物料
    pub fn upsert_material(&self, material: Material) {
        self.materials.write().unwrap().upsert(material);
    }

    /// 新增或更新構件
    pub fn upsert_piece(&self, piece: Piece) {
        self.pieces.write().unwrap().upsert(piece);
    }

    /// 寫入一筆廠區價格
    pub fn add_zone_price(&self, price: ZonePrice) -> cost_core::Result<()> {
        if !self.materials.read().unwrap().contains(&price.material_id) {
            return Err(CostError::MaterialNotFound(price.material_id.clone()));
        }
        self.catalog.write().unwrap().add_price(price)
    }

    /// 設置廠區費率
    pub fn upsert_zone_rates(&self, rates: ZoneRates) {
        self.rates.write().unwrap().upsert(rates);
    }

    // ---- 配方管理 ----

    /// 配方行預檢（不寫入）
    pub fn validate_formula_line(
        &self,
        request: &FormulaLineRequest,
    ) -> cost_core::Result<ValidationReport> {
        self.check_formula_refs(request)?;
        let line = Self::to_line(request);
        Ok(self.formulas.read().unwrap().validate_line(&line))
    }

    /// 新增或更新配方行（先驗證後寫入，驗證不過完全不落地）
    pub fn upsert_formula_line(
        &self,
        request: &FormulaLineRequest,
    ) -> cost_core::Result<ValidationReport> {
        self.check_formula_refs(request)?;
        let line = Self::to_line(request);
        self.formulas.write().unwrap().upsert_line(line)
    }

    /// 自配方移除一種物料
    pub fn remove_formula_line(&self, piece_id: &str, material_id: &str) -> cost_core::Result<()> {
        self.formulas
            .write()
            .unwrap()
            .remove_line(piece_id, material_id)
    }

    fn check_formula_refs(&self, request: &FormulaLineRequest) -> cost_core::Result<()> {
        if !self.pieces.read().unwrap().contains(&request.piece_id) {
            return Err(CostError::PieceNotFound(request.piece_id.clone()));
        }
        if !self.materials.read().unwrap().contains(&request.material_id) {
            return Err(CostError::MaterialNotFound(request.material_id.clone()));
        }
        Ok(())
    }

    fn to_line(request: &FormulaLineRequest) -> FormulaLine {
        let mut line = FormulaLine::new(
            request.piece_id.clone(),
            request.material_id.clone(),
            request.quantity_per_unit,
            request.waste_factor,
        )
        .with_optional(request.is_optional);
        if let Some(notes) = &request.notes {
            line = line.with_notes(notes.clone());
        }
        line
    }

    // ---- 端點 ----

    /// 構件計價
    pub fn piece_price(
        &self,
        request: &PiecePriceRequest,
    ) -> cost_core::Result<PiecePriceResponse> {
        let formulas = self.formulas.read().unwrap();
        let pieces = self.pieces.read().unwrap();
        let prices = PriceCache::new(self.catalog.read().unwrap().snapshot());
        let rates = self.rates.read().unwrap().snapshot();

        let calculator = CostCalculator::new(&formulas, &pieces, &prices, &rates);
        let breakdown =
            calculator.compute_price(&request.piece_id, &request.zone_id, request.effective_date)?;

        let comparison = if request.include_comparison {
            let ledger = self.ledger.lock().unwrap().snapshot();
            ComparisonEngine::new()
                .with_epsilon_percent(self.config.epsilon_percent)
                .compare(
                    &ledger,
                    &request.piece_id,
                    &request.zone_id,
                    request.effective_date,
                    breakdown.total,
                )
                .map(|c| ComparisonDto::from(&c))
        } else {
            None
        };

        Ok(PiecePriceResponse {
            breakdown: BreakdownDto::from_breakdown(&breakdown),
            comparison,
            no_price: breakdown.no_price,
            missing_materials: breakdown.missing_materials,
            warnings: breakdown.warnings,
        })
    }

    /// 物料用途反查
    pub fn where_used(&self, request: &WhereUsedRequest) -> cost_core::Result<WhereUsedResponse> {
        let as_of = parse_month_end(&request.month)?;
        self.check_material(&request.material_id)?;

        let formulas = self.formulas.read().unwrap();
        let pieces = self.pieces.read().unwrap();
        let prices = self.catalog.read().unwrap().snapshot();
        let rates = self.rates.read().unwrap().snapshot();
        let ledger = self.ledger.lock().unwrap().snapshot();

        let report = where_used::where_used_report(
            &formulas,
            &pieces,
            &prices,
            &rates,
            &ledger,
            &request.material_id,
            &request.zone_id,
            as_of,
        )?;

        Ok(WhereUsedResponse {
            total_pieces: report.total_pieces,
            total_impact: report.total_impact.round_dp(2),
            material_price: report.material_price,
            affected_pieces: report
                .affected_pieces
                .into_iter()
                .map(|entry| AffectedPieceDto {
                    piece_id: entry.piece_id,
                    piece_name: entry.piece_name,
                    piece_code: entry.piece_code,
                    unit_code: entry.unit_code,
                    quantity_per_unit: entry.quantity_per_unit,
                    waste_factor: entry.waste_factor,
                    effective_consumption: entry.effective_consumption.round_dp(4),
                    contributed_cost: entry.contributed_cost.map(|c| c.round_dp(2)),
                    participation_percent: entry.participation_percent,
                    published_price: entry.published_price,
                    total_material_cost: entry.total_material_cost.round_dp(2),
                    no_price: entry.no_price,
                })
                .collect(),
            warnings: report.warnings,
        })
    }

    /// 影響重算（模擬，不寫台帳）
    pub fn recalculate_impact(
        &self,
        request: &ImpactRequest,
        cancel: &CancellationFlag,
    ) -> cost_core::Result<ImpactResponse> {
        let as_of = parse_month_end(&request.month)?;
        self.check_material(&request.material_id)?;

        let formulas = self.formulas.read().unwrap();
        let pieces = self.pieces.read().unwrap();
        let prices = self.catalog.read().unwrap().snapshot();
        let rates = self.rates.read().unwrap().snapshot();
        let ledger = self.ledger.lock().unwrap().snapshot();

        let analyzer = ImpactAnalyzer::new(&formulas, &pieces, prices, rates, ledger);
        let report = analyzer.analyze(&request.material_id, &request.zone_id, as_of, cancel)?;

        Ok(ImpactResponse {
            affected_pieces: report.affected_pieces.len(),
            total_impact: report.total_impact.round_dp(2),
            price_updates: report
                .affected_pieces
                .into_iter()
                .map(|impact| PriceUpdateDto {
                    piece_id: impact.piece_id,
                    old_price: impact.old_price,
                    new_price: impact.new_price.map(|p| p.round_dp(2)),
                    delta: impact.delta.map(|d| d.round_dp(2)),
                    delta_percent: impact.delta_percent,
                    no_price: impact.no_price,
                })
                .collect(),
            warnings: report.warnings,
        })
    }

    /// 發布構件價格
    ///
    /// 發布當下重算一次明細並以快照入帳，台帳列因此自帶
    /// 當時的成本組成。
    pub fn publish_piece_price(
        &self,
        request: &PublishRequest,
    ) -> cost_core::Result<PublishResponse> {
        let formulas = self.formulas.read().unwrap();
        let pieces = self.pieces.read().unwrap();
        let prices = PriceCache::new(self.catalog.read().unwrap().snapshot());
        let rates = self.rates.read().unwrap().snapshot();

        let calculator = CostCalculator::new(&formulas, &pieces, &prices, &rates);
        let breakdown =
            calculator.compute_price(&request.piece_id, &request.zone_id, request.effective_date)?;

        let publisher = PricePublisher::new(request.published_by.clone());
        let mut ledger = self.ledger.lock().unwrap();
        publisher.publish_with_breakdown(
            &mut ledger,
            &breakdown,
            request.effective_date,
            request.price,
        )?;

        Ok(PublishResponse { success: true })
    }

    fn check_material(&self, material_id: &str) -> cost_core::Result<()> {
        if !self.materials.read().unwrap().contains(material_id) {
            return Err(CostError::MaterialNotFound(material_id.to_string()));
        }
        Ok(())
    }
}

/// 解析 "YYYY-MM" 為該月最後一天
///
/// 月查詢取月底：當月任何日期生效的調價都會被納入。
pub fn parse_month_end(month: &str) -> cost_core::Result<NaiveDate> {
    let (year, month_num) = month
        .split_once('-')
        .ok_or_else(|| CostError::InvalidDate(format!("月份格式應為 YYYY-MM: {}", month)))?;
    let year: i32 = year
        .parse()
        .map_err(|_| CostError::InvalidDate(format!("無效年份: {}", month)))?;
    let month_num: u32 = month_num
        .parse()
        .map_err(|_| CostError::InvalidDate(format!("無效月份: {}", month)))?;
    if !(1..=12).contains(&month_num) {
        return Err(CostError::InvalidDate(format!("無效月份: {}", month)));
    }

    let first_of_next = if month_num == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_num + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| CostError::InvalidDate(format!("無效月份: {}", month)))
}
