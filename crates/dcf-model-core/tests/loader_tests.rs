mod common;

use common::*;
use dcf_model_core::loader::schema::{ASSUMPTIONS_SHEET, DRIVERS_SHEET, IMPACT_SHEET};
use dcf_model_core::loader::{load, load_with, LoadOptions};
use dcf_model_core::normalize::NormalizeDiagnostic;
use dcf_model_core::{Cell, Grid, LoadError, Workbook};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Base assumptions
// ===========================================================================

#[test]
fn test_assumptions_read_by_normalized_label() {
    let loaded = load(&growing_business_workbook()).unwrap();
    let base = &loaded.params.base;
    assert_eq!(base.base_revenue, dec!(2000000));
    assert_eq!(base.base_fixed_opex, dec!(400000));
    assert_eq!(base.receivable_days, dec!(45));
    assert_eq!(base.inventory_days, dec!(30));
    assert_eq!(base.payable_days, dec!(60));
    assert_eq!(base.wacc, dec!(0.20));
    assert_eq!(base.perpetuity_growth, dec!(0.03));
    assert_eq!(base.tax_rate, dec!(0.30));
    assert_eq!(base.depreciation_pct, dec!(0.05));
    assert_eq!(base.capex_pct, dec!(0.06));
    assert!(loaded.warnings.is_empty());
}

#[test]
fn test_assumption_labels_tolerate_formatting() {
    let mut rows = default_assumptions();
    rows[5] = ("  wacc ", Cell::from("12.5%"));
    rows[7] = ("TASA ISR", num(dec!(30)));
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let base = load(&wb).unwrap().params.base;
    assert_eq!(base.wacc, dec!(0.125));
    assert_eq!(base.tax_rate, dec!(0.30));
}

#[test]
fn test_assumption_rows_may_be_reordered() {
    let mut rows = default_assumptions();
    rows.reverse();
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let reordered = load(&wb).unwrap().params.base;
    let original = load(&growing_business_workbook()).unwrap().params.base;
    assert_eq!(reordered, original);
}

#[test]
fn test_missing_assumption_label_names_section_and_label() {
    let rows: Vec<_> = default_assumptions()
        .into_iter()
        .filter(|(label, _)| *label != "Tasa ISR")
        .collect();
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let err = load(&wb).unwrap_err();
    assert_eq!(err, LoadError::missing_label(ASSUMPTIONS_SHEET, "tasa_isr"));
    assert_eq!(
        err.to_string(),
        "Missing schema: section 'Hipotesis_Base', label 'tasa_isr'"
    );
}

#[test]
fn test_unparseable_assumption_is_zero_with_warning() {
    let mut rows = default_assumptions();
    rows[1] = ("Gastos Fijos Operativos 2025", Cell::from("cuatrocientos mil"));
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let loaded = load(&wb).unwrap();
    assert_eq!(loaded.params.base.base_fixed_opex, Decimal::ZERO);
    assert_eq!(loaded.warnings.len(), 1);
    let warning = &loaded.warnings[0];
    assert_eq!(warning.section, ASSUMPTIONS_SHEET);
    assert_eq!(warning.cell, "B2");
    assert_eq!(
        warning.diagnostic,
        NormalizeDiagnostic::Unparseable {
            raw: "cuatrocientos mil".into()
        }
    );
}

#[test]
fn test_float_beyond_decimal_range_is_flagged() {
    let mut rows = default_assumptions();
    rows[0] = ("Ingresos Totales 2025", Cell::from_f64(1e30));
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let loaded = load(&wb).unwrap();
    assert_eq!(loaded.params.base.base_revenue, Decimal::ZERO);
    assert_eq!(loaded.warnings.len(), 1);
    assert_eq!(loaded.warnings[0].cell, "B1");
    assert_eq!(
        loaded.warnings[0].diagnostic,
        NormalizeDiagnostic::ErrorCell {
            code: "#NUM!".into()
        }
    );
}

#[test]
fn test_strict_load_rejects_unparseable_assumption() {
    let mut rows = default_assumptions();
    rows[1] = ("Gastos Fijos Operativos 2025", Cell::from("cuatrocientos mil"));
    let wb = workbook(
        assumptions_sheet(rows),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let options = LoadOptions {
        strict: true,
        ..LoadOptions::default()
    };
    let err = load_with(&wb, &options).unwrap_err();
    assert!(matches!(err, LoadError::MalformedSchema { ref section, .. } if section == ASSUMPTIONS_SHEET));
}

// ===========================================================================
// Detailed drivers
// ===========================================================================

#[test]
fn test_stream_groups_read_from_fixed_rows() {
    let loaded = load(&growing_business_workbook()).unwrap();
    let drivers = &loaded.params.drivers;
    let names: Vec<&str> = drivers.streams.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Binomio 1", "Binomio 2", "General"]);

    let levels: Vec<Decimal> = drivers.streams.iter().map(|s| s.base_level).collect();
    assert_eq!(levels, vec![dec!(800000), dec!(700000), dec!(500000)]);

    for stream in &drivers.streams {
        assert_eq!(stream.growth_rates, vec![dec!(0.05); 5]);
        assert_eq!(stream.cost_ratios, vec![dec!(0.40); 5]);
    }
    assert_eq!(drivers.variable_expense_ratios, vec![dec!(0.10); 5]);
}

#[test]
fn test_driver_percentages_accept_whole_numbers_and_percent_text() {
    let mut s = streams(dec!(0.05), dec!(0.40));
    s[0].growth = [
        num(dec!(5)),
        Cell::from("7%"),
        num(dec!(0.02)),
        Cell::Empty,
        Cell::from(" 10 "),
    ];
    let wb = workbook(
        assumptions_sheet(default_assumptions()),
        drivers_sheet(s, flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let loaded = load(&wb).unwrap();
    assert_eq!(
        loaded.params.drivers.streams[0].growth_rates,
        vec![dec!(0.05), dec!(0.07), dec!(0.02), dec!(0), dec!(0.10)]
    );
    assert!(loaded.warnings.is_empty());
}

#[test]
fn test_base_level_is_not_treated_as_percentage() {
    let mut s = streams(dec!(0.05), dec!(0.40));
    s[2].base_level = Cell::from("$1,234.5");
    let wb = workbook(
        assumptions_sheet(default_assumptions()),
        drivers_sheet(s, flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let loaded = load(&wb).unwrap();
    assert_eq!(loaded.params.drivers.streams[2].base_level, dec!(1234.5));
}

#[test]
fn test_error_cell_in_drivers_is_located() {
    let mut s = streams(dec!(0.05), dec!(0.40));
    s[1].cost_ratio[2] = Cell::Error("#DIV/0!".into());
    let wb = workbook(
        assumptions_sheet(default_assumptions()),
        drivers_sheet(s, flat(dec!(0.10))),
        no_impact_sheet(),
    );
    let loaded = load(&wb).unwrap();
    assert_eq!(loaded.params.drivers.streams[1].cost_ratios[2], Decimal::ZERO);
    assert_eq!(loaded.warnings.len(), 1);
    // data row 7 -> sheet row 9, year 3 -> column E
    assert_eq!(loaded.warnings[0].section, DRIVERS_SHEET);
    assert_eq!(loaded.warnings[0].cell, "E9");
    assert_eq!(
        loaded.warnings[0].to_string(),
        "Proyecciones_Detalladas!E9: error cell #DIV/0! read as 0"
    );
}

#[test]
fn test_truncated_drivers_sheet_is_malformed() {
    let full = drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10)));
    let truncated = Grid::from_rows(full.rows().take(10).map(|r| r.to_vec()).collect());
    let wb = workbook(
        assumptions_sheet(default_assumptions()),
        truncated,
        no_impact_sheet(),
    );
    let err = load(&wb).unwrap_err();
    match err {
        LoadError::MalformedSchema { section, detail } => {
            assert_eq!(section, DRIVERS_SHEET);
            assert!(detail.contains("outside the sheet"), "detail was {detail}");
        }
        other => panic!("expected malformed schema, got {other:?}"),
    }
}

#[test]
fn test_shorter_horizon_reads_fewer_columns() {
    let options = LoadOptions {
        horizon_years: 3,
        ..LoadOptions::default()
    };
    let loaded = load_with(&growing_business_workbook(), &options).unwrap();
    assert_eq!(loaded.params.drivers.variable_expense_ratios.len(), 3);
    assert_eq!(loaded.params.drivers.streams[0].growth_rates.len(), 3);
    assert_eq!(
        loaded.params.impact.additional_revenue,
        vec![dec!(0), dec!(60000), dec!(90000)]
    );
}

// ===========================================================================
// Project impact
// ===========================================================================

#[test]
fn test_impact_rows_read_from_columns_d_to_h() {
    let impact = load(&growing_business_workbook()).unwrap().params.impact;
    assert_eq!(
        impact.capex,
        vec![dec!(150000), dec!(50000), dec!(0), dec!(0), dec!(0)]
    );
    assert_eq!(
        impact.additional_revenue,
        vec![dec!(0), dec!(60000), dec!(90000), dec!(120000), dec!(120000)]
    );
    assert_eq!(impact.opex_savings, vec![dec!(10000); 5]);
    assert_eq!(impact.additional_depreciation, vec![dec!(20000); 5]);
}

#[test]
fn test_impact_horizon_beyond_template_is_malformed() {
    let options = LoadOptions {
        horizon_years: 6,
        ..LoadOptions::default()
    };
    let err = load_with(&growing_business_workbook(), &options).unwrap_err();
    assert!(matches!(
        err,
        LoadError::MalformedSchema { ref section, .. } if section == DRIVERS_SHEET || section == IMPACT_SHEET
    ));
}

// ===========================================================================
// Sections
// ===========================================================================

#[test]
fn test_each_missing_section_is_reported_by_name() {
    let full = growing_business_workbook();
    for missing in [ASSUMPTIONS_SHEET, DRIVERS_SHEET, IMPACT_SHEET] {
        let mut wb = Workbook::new();
        for name in full.sheet_names() {
            if name != missing {
                if let Some(grid) = full.sheet(name) {
                    wb.insert_sheet(name, grid.clone());
                }
            }
        }
        let err = load(&wb).unwrap_err();
        assert_eq!(err, LoadError::missing_section(missing));
    }
}

#[test]
fn test_extra_sheets_are_ignored() {
    let wb = growing_business_workbook().with_sheet("Notas", Grid::default());
    assert!(load(&wb).is_ok());
}
