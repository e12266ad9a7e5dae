use polars::prelude::*;
use spend_analytics::config::EngineConfig;
use spend_analytics::core::engine::{Aggregator, Dimension, KeyValue, Predicate};
use spend_analytics::core::models::ClusterId;
use spend_analytics::core::rca::{NarrativeGenerator, Transition, VarianceDecomposer};
use spend_analytics::core::views::{supplier_comparison, supplier_summary, FilterOptions};
use spend_analytics::ingestion::Ledger;
use spend_analytics::report::{aggregate_frame, contribution_frame, AnalysisReport};
use spend_analytics::AnalyticsError;
use std::io::Write;

fn ab_only() -> EngineConfig {
    EngineConfig {
        clusters: vec![ClusterId::new("AB")],
        ..EngineConfig::default()
    }
}

/// Two suppliers over three months; Alfa's 5→6 change is the 160% / -60% split
fn ledger_frame() -> DataFrame {
    df![
        "fornitore" => ["Alfa", "Alfa", "Alfa", "Alfa", "Alfa", "Beta", "Beta"],
        "categoria" => ["X", "Y", "X", "Y", "X", "X", "Y"],
        "linea" => ["Delivery", "Delivery", "Assurance", "Delivery", "Delivery", "Delivery", "Assurance"],
        "mese" => ["2024-05", "2024-05", "2024-06", "2024-06", "2024-08", "2024-05", "2024-06"],
        "vol_AB" => [Some(10.0), Some(0.0), Some(10.0), None, Some(5.0), Some(4.0), Some(2.0)],
        "cost_AB" => [Some(100.0), Some(200.0), Some(180.0), Some(170.0), Some(350.0), Some(40.0), None]
    ]
    .unwrap()
}

#[test]
fn test_end_to_end_decomposition() {
    let config = ab_only();
    let ledger = Ledger::from_frame(&ledger_frame(), &config).unwrap();
    assert_eq!(ledger.observations.len(), 7);

    let predicate = Predicate::all().supplier("Alfa");
    let decomposition = VarianceDecomposer::new(config.alert_threshold).decompose(&ledger.observations, &predicate);
    let matrix = &decomposition.matrix;

    // Month 7 is absent, so the second transition spans 6→8
    let transitions: Vec<Transition> = matrix.transitions().collect();
    assert_eq!(transitions, vec![Transition::new(5, 6), Transition::new(6, 8)]);

    let first = Transition::new(5, 6);
    assert!((matrix.get("X", first).unwrap() - 1.6).abs() < 1e-9);
    assert!((matrix.get("Y", first).unwrap() + 0.6).abs() < 1e-9);

    // 6→8: X 180 → 350, Y 170 → 0, total 350 → 350
    let second = Transition::new(6, 8);
    assert_eq!(matrix.get("X", second), Some(0.0));
    assert_eq!(matrix.get("Y", second), Some(0.0));

    assert_eq!(decomposition.alerts.len(), 2);
    assert!(decomposition.alerts.iter().all(|a| a.transition == first));

    let narrative = NarrativeGenerator::explain(matrix);
    assert_eq!(
        narrative,
        vec![
            "In the 5→6 transition, category X drove the change with a contribution of 160.0%.".to_string(),
            "Category Y offset the change with -60.0%.".to_string(),
            "In the 6→8 transition, category X drove the change with a contribution of 0.0%.".to_string(),
        ]
    );
}

#[test]
fn test_weighted_unit_cost_uses_grouped_sums() {
    let ledger = Ledger::from_frame(&ledger_frame(), &ab_only()).unwrap();
    let rows = Aggregator::aggregate(&ledger.observations, &Predicate::all(), &[Dimension::Supplier]);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text(Dimension::Supplier), Some("Alfa"));
    assert_eq!(rows[0].total_cost, 1000.0);
    assert_eq!(rows[0].total_volume, 25.0);
    assert_eq!(rows[0].weighted_unit_cost, Some(40.0));

    // Beta's null cost reads as zero
    assert_eq!(rows[1].total_cost, 40.0);
    assert_eq!(rows[1].weighted_unit_cost, Some(40.0 / 6.0));
}

#[test]
fn test_views_over_ledger() {
    let config = ab_only();
    let ledger = Ledger::from_frame(&ledger_frame(), &config).unwrap();
    let predicate = Predicate::all().line("Delivery");

    let comparison = supplier_comparison(&ledger.observations, &predicate);
    assert!(comparison.comparable);
    assert_eq!(comparison.suppliers[0].total_cost, 820.0);
    assert_eq!(comparison.suppliers[1].total_cost, 40.0);

    let summary = supplier_summary(&ledger.observations, &predicate, "Beta");
    assert_eq!(summary.total_cost, 40.0);
    assert!((summary.incidence.unwrap() - 100.0 * 40.0 / 860.0).abs() < 1e-9);

    let options = FilterOptions::from_observations(&ledger.observations, &config);
    assert_eq!(options.suppliers, vec!["Alfa", "Beta"]);
    assert_eq!(options.months, vec![5, 6, 8]);
    assert_eq!(options.lines, vec!["Delivery", "Assurance"]);
}

#[test]
fn test_missing_month_column_falls_back_to_zero() {
    let df = df![
        "fornitore" => ["Alfa", "Alfa"],
        "categoria" => ["X", "Y"],
        "vol_AB" => [1.0, 2.0],
        "cost_AB" => [10.0, 20.0]
    ]
    .unwrap();
    let ledger = Ledger::from_frame(&df, &ab_only()).unwrap();

    assert!(!ledger.schema.has_month);
    assert!(ledger.observations.iter().all(|o| o.month_index == 0));

    let decomposition = VarianceDecomposer::default().decompose(&ledger.observations, &Predicate::all());
    assert!(decomposition.matrix.is_empty());
    assert!(decomposition.alerts.is_empty());
    assert!(NarrativeGenerator::explain(&decomposition.matrix).is_empty());
}

#[test]
fn test_unknown_filter_value_is_empty_selection() {
    let ledger = Ledger::from_frame(&ledger_frame(), &ab_only()).unwrap();
    let predicate = Predicate::all().supplier("Gamma");

    assert!(Aggregator::aggregate(&ledger.observations, &predicate, &[Dimension::Month]).is_empty());
    let totals = Aggregator::totals(&ledger.observations, &predicate);
    assert_eq!(totals.total_cost, 0.0);
    assert_eq!(totals.weighted_unit_cost, None);

    let report = AnalysisReport::build(&ledger.observations, &ab_only(), &predicate);
    assert_eq!(report.comparison.suppliers.len(), 2);
    let summary = report.supplier.as_ref().unwrap();
    assert_eq!(summary.total_cost, 0.0);
    assert_eq!(summary.incidence, Some(0.0));
    assert!(report.trends[1].rows.is_empty());
    assert!(report.narrative.is_empty());
    assert!(report.render_text().unwrap().contains("No month-over-month transition"));
}

#[test]
fn test_frames_for_presentation() {
    let ledger = Ledger::from_frame(&ledger_frame(), &ab_only()).unwrap();
    let predicate = Predicate::all().supplier("Alfa");

    let group_by = [Dimension::Category];
    let rows = Aggregator::aggregate(&ledger.observations, &predicate, &group_by);
    let df = aggregate_frame(&rows, &group_by).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.column("total_cost").unwrap().f64().unwrap().get(0), Some(630.0));

    let decomposition = VarianceDecomposer::default().decompose(&ledger.observations, &predicate);
    let matrix_df = contribution_frame(&decomposition.matrix).unwrap();
    assert_eq!(matrix_df.get_column_names(), vec!["category", "5→6", "6→8"]);
}

#[test]
fn test_missing_supplier_column_is_schema_error() {
    let df = df![
        "categoria" => ["X"],
        "vol_AB" => [1.0],
        "cost_AB" => [1.0]
    ]
    .unwrap();
    let err = Ledger::from_frame(&df, &ab_only()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Schema(_)));
}

#[test]
fn test_csv_to_report() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "fornitore,categoria,linea,mese,vol_AB,cost_AB,vol_CD,cost_CD").unwrap();
    writeln!(file, "Alfa,X,Delivery,2024-05,10,100,0,50").unwrap();
    writeln!(file, "Alfa,Y,Delivery,2024-05,0,200,,").unwrap();
    writeln!(file, "Alfa,X,Delivery,2024-06,10,180,,").unwrap();
    writeln!(file, "Alfa,Y,Delivery,2024-06,0,170,,").unwrap();
    file.flush().unwrap();

    let config = EngineConfig {
        clusters: vec![ClusterId::new("AB"), ClusterId::new("CD")],
        ..EngineConfig::default()
    };
    let frame = spend_analytics::load_csv(file.path()).unwrap();
    let ledger = Ledger::from_frame(&frame, &config).unwrap();
    assert_eq!(ledger.observations.len(), 8);

    let cd_first = &ledger.observations[1];
    assert_eq!(cd_first.cluster.as_str(), "CD");
    assert_eq!(cd_first.cost, 50.0);
    assert_eq!(cd_first.unit_cost, None);

    // CD's 50 in month 5 lowers the 5→6 delta to 0
    let report = AnalysisReport::build(&ledger.observations, &config, &Predicate::all());
    let first = Transition::new(5, 6);
    assert_eq!(report.decomposition.matrix.get("X", first), Some(0.0));
    assert!(report.decomposition.alerts.is_empty());

    let ab_report = AnalysisReport::build(&ledger.observations, &config, &Predicate::all().cluster("AB"));
    assert_eq!(ab_report.decomposition.alerts.len(), 2);
}

#[test]
fn test_report_for_one_supplier_keeps_the_market_view() {
    let config = ab_only();
    let ledger = Ledger::from_frame(&ledger_frame(), &config).unwrap();
    let report = AnalysisReport::build(&ledger.observations, &config, &Predicate::all().supplier("Alfa"));

    assert!(report.comparison.comparable);
    assert_eq!(report.comparison.suppliers.len(), 2);
    assert_eq!(report.comparison.suppliers[0].cost_share, Some(1000.0 / 1040.0));
    let incidence = report.supplier.as_ref().unwrap().incidence.unwrap();
    assert!((incidence - 100.0 * 1000.0 / 1040.0).abs() < 1e-9);

    // Supplier series covers everyone, category series only Alfa
    let by_supplier = &report.trends[0];
    assert_eq!(by_supplier.series, Dimension::Supplier);
    let beta: Vec<u32> = by_supplier
        .rows
        .iter()
        .filter(|r| r.get(Dimension::Supplier) == Some(&KeyValue::Text("Beta".to_string())))
        .filter_map(|r| r.month())
        .collect();
    assert_eq!(beta, vec![5, 6]);

    let by_category = &report.trends[1];
    assert_eq!(by_category.series, Dimension::Category);
    assert_eq!(by_category.rows.len(), 5);
    let x_august = by_category
        .rows
        .iter()
        .find(|r| r.text(Dimension::Category) == Some("X") && r.month() == Some(8))
        .unwrap();
    assert_eq!(x_august.total_cost, 350.0);
    assert_eq!(x_august.weighted_unit_cost, Some(70.0));

    let text = report.render_text().unwrap();
    assert!(text.contains("Monthly trend by supplier"));
    assert!(text.contains("Monthly trend by category"));
}
