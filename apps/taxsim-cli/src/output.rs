//! Plain-text rendering of results and tables.

use std::fmt::Write;

use clap::ValueEnum;
use taxsim_core::brackets::BracketResolution;
use taxsim_core::factor_r::FactorRReport;
use taxsim_core::rateio::AllocationStatus;
use taxsim_core::{BracketTable, SimulationResult};

/// Output format for `simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Writing into a `String` cannot fail.
macro_rules! out {
    ($buf:expr) => {{
        let _ = writeln!($buf);
    }};
    ($buf:expr, $($arg:tt)*) => {{
        let _ = writeln!($buf, $($arg)*);
    }};
}

pub fn render_result(result: &SimulationResult) -> String {
    let mut s = String::new();

    out!(s, "Simulation {} ({})", result.id, result.simulated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    out!(s, "Regime: {}", result.regime);
    out!(s);

    out!(s, "{:<16} {:>10} {:>14} {:>10} {:>14}", "Item", "Qty", "Unit price", "Disc. %", "Revenue");
    for b in &result.lines {
        out!(
            s,
            "{:<16} {:>10.2} {:>14.2} {:>10.2} {:>14.2}",
            truncate(b.line.item_id(), 16),
            b.line.quantity,
            b.line.final_unit_price,
            b.line.discount_percent,
            b.revenue
        );
    }
    out!(s);

    let d = &result.discount;
    match d.status {
        AllocationStatus::Applied => {
            out!(
                s,
                "Discount: {:.2} ({:.2}%) of list {:.2}",
                d.applied_discount, d.applied_discount_percent, d.gross_list_total
            );
            if d.negative_prices {
                out!(s, "  warning: rateio base too small, some unit prices are negative");
            }
        }
        AllocationStatus::NoEligibleLines => {
            out!(
                s,
                "Discount: {:.2} required but no line participates in rateio",
                d.required_discount
            );
        }
        AllocationStatus::TargetNotBelowList => {
            out!(s, "Discount: none (target not below list total {:.2})", d.gross_list_total);
        }
        AllocationStatus::InvalidTarget => out!(s, "Discount: none (target ignored, not a valid amount)"),
        AllocationStatus::NoTarget => out!(s, "Discount: none"),
    }
    out!(s);

    out!(s, "Taxes");
    for c in &result.components {
        let rate = c.rate.map(|r| format!("{:.4}%", r)).unwrap_or_default();
        out!(s, "  {:<24} {:>14.2} {:>10}", c.name, c.value, rate);
        if let Some(note) = &c.note {
            out!(s, "    {}", note);
        }
    }
    out!(s, "  {:<24} {:>14.2}", "Total", result.sales_tax_total);
    out!(s);

    out!(s, "{:<26} {:>14.2}", "Gross revenue", result.gross_revenue);
    out!(s, "{:<26} {:>14.2}", "Item cost", result.total_cost);
    out!(s, "{:<26} {:>14.2}", "Purchase tax (est.)", result.purchase_tax);
    out!(s, "{:<26} {:>14.2}", "Interstate diff. (est.)", result.interstate_differential);
    if let Some(base) = result.profit_base {
        out!(s, "{:<26} {:>14.2}", "Profit base", base);
    }
    out!(
        s,
        "{:<26} {:>14.2} ({:.2}%)",
        "Gross margin", result.gross_margin, result.gross_margin_percent
    );

    if let Some(report) = &result.factor_r {
        out!(s);
        s.push_str(&render_factor_r(report));
    }

    s
}

pub fn render_factor_r(report: &FactorRReport) -> String {
    let mut s = String::new();
    match report.ratio {
        Some(ratio) => out!(s, "Factor R: {:.2}% [{:?}]", ratio * 100.0, report.status),
        None => out!(s, "Factor R: n/a [{:?}]", report.status),
    }
    out!(s, "  {}", report.note);
    s
}

pub fn render_resolution(table: &BracketTable, res: &BracketResolution) -> String {
    let mut s = String::new();
    out!(
        s,
        "{}, bracket {} of {} (up to {:.2})",
        table.anexo,
        res.position,
        table.brackets.len(),
        res.bracket.upper_limit
    );
    out!(
        s,
        "  nominal {:.2}%, deduction {:.2}, RBT12 used {:.2}",
        res.bracket.nominal_rate, res.bracket.deduction, res.revenue_used
    );
    out!(s, "  effective rate {:.4}%", res.effective_rate);
    s
}

pub fn render_table(table: &BracketTable) -> String {
    let mut s = String::new();
    out!(s, "{}", table.anexo);
    out!(s, "  {:>3} {:>16} {:>10} {:>14}", "#", "Up to", "Rate %", "Deduction");
    for (i, b) in table.brackets.iter().enumerate() {
        out!(
            s,
            "  {:>3} {:>16.2} {:>10.2} {:>14.2}",
            i + 1,
            b.upper_limit,
            b.nominal_rate,
            b.deduction
        );
    }
    s
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}
