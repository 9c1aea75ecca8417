//! 集成測試

use chrono::NaiveDate;
use cost_calc::CancellationFlag;
use cost_cache::PriceCache;
use cost_core::{Material, Piece, ZonePrice, ZoneRates};
use cost_service::{
    CostService, FormulaLineRequest, ImpactRequest, PiecePriceRequest, PublishRequest,
    ServiceConfig, WhereUsedRequest,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 建立一個小型廠區場景：
///   兩種物料（水泥、鋼筋）、兩個構件（梁、板）
///   梁用水泥+鋼筋，板只用水泥
fn seeded_service() -> CostService {
    let service = CostService::new(ServiceConfig::new().with_epsilon_percent(dec!(0.5)));

    service.upsert_material(
        Material::new(
            "MAT-CEM".to_string(),
            "CEM-42.5".to_string(),
            "水泥 42.5".to_string(),
        )
        .with_category("CEMENTO".to_string())
        .with_unit_of_measure("kg".to_string()),
    );
    service.upsert_material(
        Material::new(
            "MAT-ACE".to_string(),
            "ACE-B500".to_string(),
            "鋼筋 B500".to_string(),
        )
        .with_category("ACERO".to_string())
        .with_unit_of_measure("kg".to_string()),
    );

    service.upsert_piece(
        Piece::new(
            "PZ-VIGA".to_string(),
            "預鑄梁".to_string(),
            "VIGA-12".to_string(),
        )
        .with_weight_per_unit(dec!(2))
        .with_steel_kg_per_unit(dec!(100)),
    );
    service.upsert_piece(Piece::new(
        "PZ-LOSA".to_string(),
        "預鑄板".to_string(),
        "LOSA-01".to_string(),
    ));

    for (piece, material, qty, waste) in [
        ("PZ-VIGA", "MAT-CEM", dec!(2.5), dec!(1.1)),
        ("PZ-VIGA", "MAT-ACE", dec!(1), dec!(1.0)),
        ("PZ-LOSA", "MAT-CEM", dec!(4), dec!(1.0)),
    ] {
        service
            .upsert_formula_line(&FormulaLineRequest {
                piece_id: piece.to_string(),
                material_id: material.to_string(),
                quantity_per_unit: qty,
                waste_factor: waste,
                is_optional: false,
                notes: None,
            })
            .unwrap();
    }

    service
        .add_zone_price(ZonePrice::new(
            "MAT-CEM".to_string(),
            "ZONA-1".to_string(),
            date(2025, 1, 1),
            dec!(10),
        ))
        .unwrap();
    service
        .add_zone_price(ZonePrice::new(
            "MAT-ACE".to_string(),
            "ZONA-1".to_string(),
            date(2025, 1, 1),
            dec!(4),
        ))
        .unwrap();

    service.upsert_zone_rates(
        ZoneRates::new("ZONA-1".to_string())
            .with_process_rate_per_ton(dec!(5))
            .with_labor_rate_concrete_per_ton(dec!(3))
            .with_labor_rate_steel_per_kg(dec!(0.2)),
    );

    service
}

#[test]
fn test_piece_price_end_to_end() {
    let service = seeded_service();

    let response = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 6, 1),
            include_comparison: true,
        })
        .unwrap();

    // 物料 2.5*1.1*10 + 1*1*4 = 31.50
    assert_eq!(response.breakdown.materials, dec!(31.50));
    // 製程 2*5=10、混凝土人工 2*3=6、鋼筋人工 100*0.2=20
    assert_eq!(response.breakdown.process_per_ton, dec!(10.00));
    assert_eq!(response.breakdown.labor_concrete, dec!(6.00));
    assert_eq!(response.breakdown.labor_steel, dec!(20.00));
    assert_eq!(response.breakdown.total, dec!(67.50));
    assert!(!response.no_price);
    assert!(response.comparison.is_none()); // 尚無發布
}

#[test]
fn test_material_price_change_propagation_cycle() {
    // 完整流程：發布基準價 → 物料調價 → 影響重算 → 選擇性發布
    let service = seeded_service();

    // 1. 發布兩個構件的基準價
    for (piece, price) in [("PZ-VIGA", dec!(67.50)), ("PZ-LOSA", dec!(40))] {
        service
            .publish_piece_price(&PublishRequest {
                piece_id: piece.to_string(),
                zone_id: "ZONA-1".to_string(),
                effective_date: date(2025, 6, 1),
                price,
                published_by: "maria".to_string(),
            })
            .unwrap();
    }

    // 2. 水泥 7/1 調價 10 → 12
    service
        .add_zone_price(ZonePrice::new(
            "MAT-CEM".to_string(),
            "ZONA-1".to_string(),
            date(2025, 7, 1),
            dec!(12),
        ))
        .unwrap();

    // 3. 影響重算（7 月）
    let impact = service
        .recalculate_impact(
            &ImpactRequest {
                material_id: "MAT-CEM".to_string(),
                zone_id: "ZONA-1".to_string(),
                month: "2025-07".to_string(),
            },
            &CancellationFlag::new(),
        )
        .unwrap();

    assert_eq!(impact.affected_pieces, 2);
    // 貢獻成本：VIGA 2.75*12=33、LOSA 4*12=48
    assert_eq!(impact.total_impact, dec!(81.00));

    let viga = impact
        .price_updates
        .iter()
        .find(|u| u.piece_id == "PZ-VIGA")
        .unwrap();
    // 新總價 = (33 + 4) + 10 + 6 + 20 = 73.00，舊發布價 67.50
    assert_eq!(viga.old_price, Some(dec!(67.50)));
    assert_eq!(viga.new_price, Some(dec!(73.00)));
    assert_eq!(viga.delta, Some(dec!(5.50)));

    // 4. 發布前的趨勢比較：新算價 73.00 vs 上次發布 67.50 → +8.15%
    let response = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 7, 1),
            include_comparison: true,
        })
        .unwrap();
    let comparison = response.comparison.unwrap();
    assert_eq!(comparison.trend, cost_calc::Trend::Up);
    assert_eq!(comparison.delta_percent, Some(dec!(8.15)));

    // 5. 操作員只發布梁的新價；之後相對最新發布價趨勢持平
    service
        .publish_piece_price(&PublishRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 7, 15),
            price: dec!(73.00),
            published_by: "maria".to_string(),
        })
        .unwrap();
    let response = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 8, 1),
            include_comparison: true,
        })
        .unwrap();
    assert_eq!(response.comparison.unwrap().trend, cost_calc::Trend::Flat);

    // 6. 歷史完整保留：6/1 當下的有效價仍是 67.50
    let june = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 6, 15),
            include_comparison: true,
        })
        .unwrap();
    // 6 月中計價仍用舊物料價，無比較基準早於 6/1 之外的干擾
    assert_eq!(june.breakdown.materials, dec!(31.50));
}

#[test]
fn test_where_used_report_shapes() {
    let service = seeded_service();

    let report = service
        .where_used(&WhereUsedRequest {
            material_id: "MAT-CEM".to_string(),
            zone_id: "ZONA-1".to_string(),
            month: "2025-06".to_string(),
        })
        .unwrap();

    assert_eq!(report.total_pieces, 2);
    assert_eq!(report.material_price, Some(dec!(10)));
    // VIGA 2.75*10=27.50 + LOSA 4*10=40
    assert_eq!(report.total_impact, dec!(67.50));

    let viga = report
        .affected_pieces
        .iter()
        .find(|e| e.piece_id == "PZ-VIGA")
        .unwrap();
    assert_eq!(viga.effective_consumption, dec!(2.7500));
    assert_eq!(viga.contributed_cost, Some(dec!(27.50)));
    // 27.50 / 67.50 ≈ 40.74%
    assert_eq!(viga.participation_percent, Some(dec!(40.74)));
    assert_eq!(viga.unit_code, "un");
}

#[test]
fn test_missing_price_distinct_from_free_material() {
    let service = seeded_service();

    // 新物料無任何廠區價格
    service.upsert_material(Material::new(
        "MAT-ADITIVO".to_string(),
        "ADI-01".to_string(),
        "外加劑".to_string(),
    ));
    service
        .upsert_formula_line(&FormulaLineRequest {
            piece_id: "PZ-LOSA".to_string(),
            material_id: "MAT-ADITIVO".to_string(),
            quantity_per_unit: dec!(0.5),
            waste_factor: dec!(1.0),
            is_optional: false,
            notes: None,
        })
        .unwrap();

    let response = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-LOSA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 6, 1),
            include_comparison: false,
        })
        .unwrap();

    // 缺價走專用通道，不以 0 矇混：已計價部分照常合計
    assert!(response.no_price);
    assert_eq!(response.missing_materials, vec!["MAT-ADITIVO".to_string()]);
    assert_eq!(response.breakdown.materials, dec!(40.00));

    // 影響分析將該構件排除於合計之外
    let impact = service
        .recalculate_impact(
            &ImpactRequest {
                material_id: "MAT-CEM".to_string(),
                zone_id: "ZONA-1".to_string(),
                month: "2025-06".to_string(),
            },
            &CancellationFlag::new(),
        )
        .unwrap();
    let losa = impact
        .price_updates
        .iter()
        .find(|u| u.piece_id == "PZ-LOSA")
        .unwrap();
    assert!(losa.no_price);
    assert!(losa.new_price.is_none());
    // 合計只含 VIGA 的水泥貢獻 27.50
    assert_eq!(impact.total_impact, dec!(27.50));
    assert!(!impact.warnings.is_empty());

    // 反查報表逐列帶缺價旗標，呼叫端不需解析 warnings 字串
    let report = service
        .where_used(&WhereUsedRequest {
            material_id: "MAT-CEM".to_string(),
            zone_id: "ZONA-1".to_string(),
            month: "2025-06".to_string(),
        })
        .unwrap();
    let losa = report
        .affected_pieces
        .iter()
        .find(|e| e.piece_id == "PZ-LOSA")
        .unwrap();
    assert!(losa.no_price);
    let viga = report
        .affected_pieces
        .iter()
        .find(|e| e.piece_id == "PZ-VIGA")
        .unwrap();
    assert!(!viga.no_price);
}

#[test]
fn test_request_scoped_cache_with_invalidation_hook() {
    use std::sync::Arc;

    let mut catalog = cost_core::ZonePriceCatalog::new();
    catalog
        .add_price(ZonePrice::new(
            "MAT-CEM".to_string(),
            "ZONA-1".to_string(),
            date(2025, 1, 1),
            dec!(10),
        ))
        .unwrap();

    let cache = Arc::new(PriceCache::new(catalog.snapshot()));
    let hook_cache = Arc::clone(&cache);
    catalog.register_invalidation_hook(Arc::new(move |material_id, _zone_id| {
        hook_cache.invalidate_material(material_id);
    }));

    // 讀穿並命中
    assert_eq!(
        cache.price_as_of("MAT-CEM", "ZONA-1", date(2025, 6, 1)),
        Some(dec!(10))
    );
    cache.price_as_of("MAT-CEM", "ZONA-1", date(2025, 6, 1));
    let (hits, _) = cache.stats();
    assert_eq!(hits, 1);

    // 目錄寫入 → 掛鉤清掉該物料的快取項
    catalog
        .add_price(ZonePrice::new(
            "MAT-CEM".to_string(),
            "ZONA-1".to_string(),
            date(2025, 7, 1),
            dec!(12),
        ))
        .unwrap();

    let (_, misses_before) = cache.stats();
    cache.price_as_of("MAT-CEM", "ZONA-1", date(2025, 6, 1));
    let (_, misses_after) = cache.stats();
    assert_eq!(misses_after, misses_before + 1);
}

#[test]
fn test_validate_formula_precheck_shapes() {
    let service = seeded_service();

    let report = service
        .validate_formula_line(&FormulaLineRequest {
            piece_id: "PZ-VIGA".to_string(),
            material_id: "MAT-CEM".to_string(),
            quantity_per_unit: dec!(0),
            waste_factor: dec!(0.5),
            is_optional: false,
            notes: None,
        })
        .unwrap();

    // 非正數用量 + 損耗 < 1.0 + 重複物料 = 三項錯誤
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 3);

    // 預檢不落地：配方未被改動
    let response = service
        .piece_price(&PiecePriceRequest {
            piece_id: "PZ-VIGA".to_string(),
            zone_id: "ZONA-1".to_string(),
            effective_date: date(2025, 6, 1),
            include_comparison: false,
        })
        .unwrap();
    assert_eq!(response.breakdown.materials, dec!(31.50));
}

#[test]
fn test_zero_quantity_decimal_semantics() {
    // 定點算術健全性：0.1+0.2 類問題不存在
    let a = dec!(0.1) + dec!(0.2);
    assert_eq!(a, dec!(0.3));
    let product = dec!(2.5) * dec!(1.1) * dec!(10);
    assert_eq!(product, Decimal::from_str_exact("27.50").unwrap());
}
