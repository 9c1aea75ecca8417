//! 簡單成本滾算示例

use chrono::NaiveDate;
use cost_cache::PriceCache;
use cost_calc::{CancellationFlag, CostCalculator, ImpactAnalyzer};
use cost_core::{
    FormulaLine, FormulaStore, Piece, PieceMaster, PriceLedger, PublishedPiecePrice, RateTable,
    ZonePrice, ZonePriceCatalog, ZoneRates,
};
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    println!("=== 簡單成本滾算示例 ===\n");

    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

    // 構件主檔
    let mut pieces = PieceMaster::new();
    pieces.upsert(
        Piece::new(
            "PZ-VIGA-12".to_string(),
            "預鑄梁 12m".to_string(),
            "VIGA-12".to_string(),
        )
        .with_weight_per_unit(Decimal::new(85, 1)) // 8.5 tn
        .with_steel_kg_per_unit(Decimal::from(420)),
    );

    // 配方：水泥 + 鋼筋
    let mut formulas = FormulaStore::new();
    formulas.upsert_line(FormulaLine::new(
        "PZ-VIGA-12".to_string(),
        "MAT-CEM".to_string(),
        Decimal::new(2100, 0),
        Decimal::new(105, 2), // 損耗 1.05
    ))?;
    formulas.upsert_line(FormulaLine::new(
        "PZ-VIGA-12".to_string(),
        "MAT-ACE".to_string(),
        Decimal::from(420),
        Decimal::new(102, 2),
    ))?;

    // 廠區價格與費率
    let mut catalog = ZonePriceCatalog::new();
    catalog.add_price(ZonePrice::new(
        "MAT-CEM".to_string(),
        "ZONA-NORTE".to_string(),
        date(2025, 1, 1),
        Decimal::new(12, 2), // 0.12 / kg
    ))?;
    catalog.add_price(ZonePrice::new(
        "MAT-ACE".to_string(),
        "ZONA-NORTE".to_string(),
        date(2025, 1, 1),
        Decimal::new(95, 2), // 0.95 / kg
    ))?;

    let mut rates = RateTable::new();
    rates.upsert(
        ZoneRates::new("ZONA-NORTE".to_string())
            .with_process_rate_per_ton(Decimal::new(1850, 2))
            .with_labor_rate_concrete_per_ton(Decimal::new(1200, 2))
            .with_labor_rate_steel_per_kg(Decimal::new(35, 2)),
    );

    // 計價（查價走請求範圍的讀穿快取）
    let prices = PriceCache::new(catalog.snapshot());
    let calculator = CostCalculator::new(&formulas, &pieces, &prices, &rates);
    let breakdown = calculator.compute_price("PZ-VIGA-12", "ZONA-NORTE", date(2025, 6, 1))?;

    println!("構件 PZ-VIGA-12 @ ZONA-NORTE (2025-06-01):");
    println!("  物料小計:       {}", breakdown.materials.round_dp(2));
    println!("  製程小計:       {}", breakdown.process_per_ton.round_dp(2));
    println!("  混凝土人工小計: {}", breakdown.labor_concrete.round_dp(2));
    println!("  鋼筋人工小計:   {}", breakdown.labor_steel.round_dp(2));
    println!("  總計:           {}", breakdown.total.round_dp(2));

    // 發布後模擬水泥調價的影響
    let mut ledger = PriceLedger::new();
    ledger.append(PublishedPiecePrice::new(
        "PZ-VIGA-12".to_string(),
        "ZONA-NORTE".to_string(),
        date(2025, 6, 1),
        breakdown.total.round_dp(2),
        "demo".to_string(),
    ))?;

    catalog.add_price(ZonePrice::new(
        "MAT-CEM".to_string(),
        "ZONA-NORTE".to_string(),
        date(2025, 7, 1),
        Decimal::new(15, 2), // 調到 0.15 / kg
    ))?;

    let analyzer = ImpactAnalyzer::new(
        &formulas,
        &pieces,
        catalog.snapshot(),
        rates.snapshot(),
        ledger.snapshot(),
    );
    let report = analyzer.analyze(
        "MAT-CEM",
        "ZONA-NORTE",
        date(2025, 7, 15),
        &CancellationFlag::new(),
    )?;

    println!("\n水泥調價影響（0.12 → 0.15）:");
    for impact in &report.affected_pieces {
        println!(
            "  {}: 舊價 {:?} → 新價 {:?} (Δ {:?})",
            impact.piece_id, impact.old_price, impact.new_price, impact.delta
        );
    }

    Ok(())
}
