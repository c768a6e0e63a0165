#![allow(dead_code)]

use dcf_model_core::loader::schema::{ASSUMPTIONS_SHEET, DRIVERS_SHEET, IMPACT_SHEET};
use dcf_model_core::{Cell, Grid, Workbook};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct StreamFixture {
    pub name: &'static str,
    pub base_level: Cell,
    pub growth: [Cell; 5],
    pub cost_ratio: [Cell; 5],
}

pub fn num(d: Decimal) -> Cell {
    Cell::from(d)
}

pub fn flat(d: Decimal) -> [Cell; 5] {
    std::array::from_fn(|_| Cell::from(d))
}

/// Labels in column A, values in column B, as laid out in the template.
pub fn assumptions_sheet(rows: Vec<(&str, Cell)>) -> Grid {
    Grid::from_rows(
        rows.into_iter()
            .map(|(label, value)| vec![Cell::from(label), value])
            .collect(),
    )
}

pub fn default_assumptions() -> Vec<(&'static str, Cell)> {
    vec![
        ("Ingresos Totales 2025", num(dec!(2000000))),
        ("Gastos Fijos Operativos 2025", num(dec!(400000))),
        ("Dias CxC", num(dec!(45))),
        ("Dias Inv", num(dec!(30))),
        ("Dias CxP", num(dec!(60))),
        ("WACC", num(dec!(0.20))),
        ("G-Tasa de crecimiento a perpetuidad", num(dec!(0.03))),
        ("Tasa ISR", num(dec!(0.30))),
        ("Dep Pct Base", num(dec!(0.05))),
        ("CapEx Pct Base", num(dec!(0.06))),
    ]
}

/// Header row, then 14 data rows; column B is 2025, columns C..G are 2026..2030.
pub fn drivers_sheet(streams: [StreamFixture; 3], variable_ratio: [Cell; 5]) -> Grid {
    let header: Vec<Cell> = std::iter::once(Cell::from("Concepto"))
        .chain((2025..=2030).map(|y| Cell::from(y as i64)))
        .collect();
    let mut rows = vec![header];

    let year_row = |label: String, values: [Cell; 5]| {
        let mut row = vec![Cell::from(label), Cell::Empty];
        row.extend(values);
        row
    };

    for stream in streams {
        rows.push(vec![Cell::from(stream.name)]);
        rows.push(vec![Cell::from(format!("Ingresos {}", stream.name)), stream.base_level]);
        rows.push(year_row(format!("Crecimiento {}", stream.name), stream.growth));
        rows.push(year_row(format!("Costo {}", stream.name), stream.cost_ratio));
    }
    rows.push(vec![Cell::from("Gastos")]);
    rows.push(year_row("Gastos Variables %".into(), variable_ratio));
    Grid::from_rows(rows)
}

/// Two header rows; project rows are 4 apart, values in columns D..H.
pub fn impact_sheet(
    capex: [Cell; 5],
    revenue: [Cell; 5],
    savings: [Cell; 5],
    depreciation: [Cell; 5],
) -> Grid {
    let mut rows = vec![
        vec![Cell::from("Impacto de Proyectos")],
        vec![
            Cell::from("Proyecto"),
            Cell::Empty,
            Cell::Empty,
            Cell::from(2026i64),
            Cell::from(2027i64),
            Cell::from(2028i64),
            Cell::from(2029i64),
            Cell::from(2030i64),
        ],
    ];
    let mut series = [capex, revenue, savings, depreciation].into_iter();
    for data_row in 0..=12 {
        let mut row = vec![Cell::from(format!("fila {data_row}")), Cell::Empty, Cell::Empty];
        if data_row % 4 == 0 {
            if let Some(values) = series.next() {
                row.extend(values);
            }
        }
        rows.push(row);
    }
    Grid::from_rows(rows)
}

pub fn no_impact_sheet() -> Grid {
    let zero = || flat(Decimal::ZERO);
    impact_sheet(zero(), zero(), zero(), zero())
}

pub fn streams(growth: Decimal, cost_ratio: Decimal) -> [StreamFixture; 3] {
    [
        ("Binomio 1", dec!(800000)),
        ("Binomio 2", dec!(700000)),
        ("General", dec!(500000)),
    ]
    .map(|(name, level)| StreamFixture {
        name,
        base_level: num(level),
        growth: flat(growth),
        cost_ratio: flat(cost_ratio),
    })
}

pub fn workbook(assumptions: Grid, drivers: Grid, impact: Grid) -> Workbook {
    Workbook::new()
        .with_sheet(ASSUMPTIONS_SHEET, assumptions)
        .with_sheet(DRIVERS_SHEET, drivers)
        .with_sheet(IMPACT_SHEET, impact)
}

/// Zero growth, zero cost ratios, zero working-capital days and base
/// percentages, no projects: FCF reduces to NOPAT.
pub fn flat_business_workbook() -> Workbook {
    let assumptions = assumptions_sheet(vec![
        ("Ingresos Totales 2025", num(dec!(2000000))),
        ("Gastos Fijos Operativos 2025", num(dec!(400000))),
        ("Dias CxC", num(Decimal::ZERO)),
        ("Dias Inv", num(Decimal::ZERO)),
        ("Dias CxP", num(Decimal::ZERO)),
        ("WACC", Cell::from("20%")),
        ("G-Tasa de crecimiento a perpetuidad", Cell::from("3%")),
        ("Tasa ISR", Cell::from("30%")),
        ("Dep Pct Base", num(Decimal::ZERO)),
        ("CapEx Pct Base", num(Decimal::ZERO)),
    ]);
    workbook(
        assumptions,
        drivers_sheet(streams(Decimal::ZERO, Decimal::ZERO), flat(Decimal::ZERO)),
        no_impact_sheet(),
    )
}

/// A growing business with working capital, depreciation, capex and one
/// project layered on top.
pub fn growing_business_workbook() -> Workbook {
    workbook(
        assumptions_sheet(default_assumptions()),
        drivers_sheet(streams(dec!(0.05), dec!(0.40)), flat(dec!(0.10))),
        impact_sheet(
            [dec!(150000), dec!(50000), dec!(0), dec!(0), dec!(0)].map(num),
            [dec!(0), dec!(60000), dec!(90000), dec!(120000), dec!(120000)].map(num),
            flat(dec!(10000)),
            flat(dec!(20000)),
        ),
    )
}
