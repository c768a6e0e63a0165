//! Plain tabular views of a completed run, for export and display.
//!
//! Column order follows the projection and valuation field order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::params::ProjectImpact;
use crate::types::Money;
use crate::valuation::{ValuationResult, ValuationSummary, YearProjection};

pub const SUMMARY_TABLE: &str = "Sumario_Valuacion";
pub const PROJECTION_TABLE: &str = "Proyecciones_Detalladas";
pub const PROJECT_ANALYSIS_TABLE: &str = "Analisis_Proyectos";

/// A named sheet-like table of already-computed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Incremental project effect for one forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectImpactRow {
    pub year: i32,
    /// Total FCF less the additional project revenue
    pub fcf_base: Money,
    pub additional_revenue: Money,
    pub project_capex: Money,
    pub fcf_total: Money,
}

pub fn project_impact_rows(
    projection: &[YearProjection],
    impact: &ProjectImpact,
) -> Vec<ProjectImpactRow> {
    projection
        .iter()
        .enumerate()
        .map(|(idx, year)| {
            let additional_revenue = impact
                .additional_revenue
                .get(idx)
                .copied()
                .unwrap_or(Decimal::ZERO);
            ProjectImpactRow {
                year: year.year,
                fcf_base: year.fcf - additional_revenue,
                additional_revenue,
                project_capex: impact.capex.get(idx).copied().unwrap_or(Decimal::ZERO),
                fcf_total: year.fcf,
            }
        })
        .collect()
}

pub fn summary_table(summary: &ValuationSummary, valuation: &ValuationResult) -> LabeledTable {
    let optional = |v: Option<Decimal>| v.map(|d| d.to_string()).unwrap_or_default();
    let rows = vec![
        ("enterprise_value", summary.enterprise_value.to_string()),
        ("pv_projected_fcf", summary.pv_projected_fcf.to_string()),
        ("terminal_value", valuation.terminal_value.to_string()),
        ("pv_terminal_value", summary.pv_terminal_value.to_string()),
        ("ev_to_revenue", optional(valuation.ev_to_revenue)),
        ("ev_to_ebitda", optional(valuation.ev_to_ebitda)),
        ("wacc", summary.wacc.to_string()),
        ("growth", summary.growth.to_string()),
        ("tax_rate", summary.tax_rate.to_string()),
    ];
    LabeledTable {
        name: SUMMARY_TABLE.into(),
        headers: vec!["metric".into(), "value".into()],
        rows: rows
            .into_iter()
            .map(|(metric, value)| vec![metric.to_string(), value])
            .collect(),
    }
}

pub fn projection_table(projection: &[YearProjection], stream_names: &[String]) -> LabeledTable {
    let mut headers: Vec<String> = vec!["year".into()];
    headers.extend(stream_names.iter().map(|n| format!("revenue[{n}]")));
    headers.extend(
        [
            "total_revenue",
            "ebit",
            "depreciation",
            "nopat",
            "working_capital",
            "working_capital_change",
            "capex",
            "fcf",
            "discount_factor",
            "discounted_fcf",
        ]
        .map(String::from),
    );

    let rows = projection
        .iter()
        .map(|y| {
            let mut row = vec![y.year.to_string()];
            row.extend(y.stream_revenues.iter().map(Decimal::to_string));
            row.extend(
                [
                    y.total_revenue,
                    y.ebit,
                    y.depreciation,
                    y.nopat,
                    y.working_capital,
                    y.working_capital_change,
                    y.capex,
                    y.fcf,
                    y.discount_factor,
                    y.discounted_fcf,
                ]
                .map(|d| d.to_string()),
            );
            row
        })
        .collect();

    LabeledTable {
        name: PROJECTION_TABLE.into(),
        headers,
        rows,
    }
}

pub fn project_analysis_table(rows: &[ProjectImpactRow]) -> LabeledTable {
    LabeledTable {
        name: PROJECT_ANALYSIS_TABLE.into(),
        headers: ["year", "fcf_base", "additional_revenue", "project_capex", "fcf_total"]
            .map(String::from)
            .to_vec(),
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    r.year.to_string(),
                    r.fcf_base.to_string(),
                    r.additional_revenue.to_string(),
                    r.project_capex.to_string(),
                    r.fcf_total.to_string(),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn year(period: u32, fcf: Money) -> YearProjection {
        YearProjection {
            year: 2025 + period as i32,
            period,
            stream_revenues: vec![dec!(600), dec!(400)],
            base_revenue: dec!(1000),
            total_revenue: dec!(1000),
            cost_of_sales: Decimal::ZERO,
            fixed_opex: Decimal::ZERO,
            variable_opex: Decimal::ZERO,
            ebit: fcf,
            depreciation: Decimal::ZERO,
            nopat: fcf,
            working_capital: Decimal::ZERO,
            working_capital_change: Decimal::ZERO,
            capex: Decimal::ZERO,
            fcf,
            discount_factor: Decimal::ONE,
            discounted_fcf: fcf,
        }
    }

    #[test]
    fn test_project_impact_rows_subtract_additional_revenue() {
        let projection = vec![year(1, dec!(100)), year(2, dec!(120))];
        let impact = ProjectImpact {
            capex: vec![dec!(30), dec!(0)],
            additional_revenue: vec![dec!(10), dec!(15)],
            opex_savings: vec![Decimal::ZERO; 2],
            additional_depreciation: vec![Decimal::ZERO; 2],
        };
        let rows = project_impact_rows(&projection, &impact);
        assert_eq!(
            rows[1],
            ProjectImpactRow {
                year: 2027,
                fcf_base: dec!(105),
                additional_revenue: dec!(15),
                project_capex: dec!(0),
                fcf_total: dec!(120),
            }
        );
    }

    #[test]
    fn test_projection_table_columns_follow_field_order() {
        let names = vec!["Binomio 1".to_string(), "Binomio 2".to_string()];
        let table = projection_table(&[year(1, dec!(100))], &names);
        assert_eq!(table.headers[0], "year");
        assert_eq!(table.headers[1], "revenue[Binomio 1]");
        assert_eq!(table.headers[3], "total_revenue");
        assert_eq!(table.headers.last().map(String::as_str), Some("discounted_fcf"));
        assert_eq!(table.rows[0].len(), table.headers.len());
        assert_eq!(table.rows[0][0], "2026");
    }

    #[test]
    fn test_project_analysis_table_shape() {
        let rows = vec![ProjectImpactRow {
            year: 2026,
            fcf_base: dec!(90),
            additional_revenue: dec!(10),
            project_capex: dec!(30),
            fcf_total: dec!(100),
        }];
        let table = project_analysis_table(&rows);
        assert_eq!(table.name, PROJECT_ANALYSIS_TABLE);
        assert_eq!(table.rows, vec![vec!["2026", "90", "10", "30", "100"]]);
    }
}
