//! Headline KPI cards, shared by the dashboard and the transactions page.

use maud::{Markup, html};

use crate::{
    aggregation::Kpis,
    html::{amount_class, format_currency},
};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// Renders the income, expense and net totals as a row of cards.
pub(crate) fn kpi_cards(kpis: &Kpis, currency_symbol: &str) -> Markup {
    html! {
        section class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full" aria-label="Totals"
        {
            (kpi_card("income", "Total Income", kpis.income, amount_class(kpis.income), currency_symbol))
            (kpi_card("expense", "Total Expense", kpis.expense, amount_class(-kpis.expense), currency_symbol))
            (kpi_card("net", "Net", kpis.net, amount_class(kpis.net), currency_symbol))
        }
    }
}

fn kpi_card(
    key: &str,
    label: &str,
    amount: f64,
    amount_style: &str,
    currency_symbol: &str,
) -> Markup {
    html! {
        div class=(CARD_STYLE) data-kpi=(key)
        {
            p class="text-sm text-gray-600 dark:text-gray-400" { (label) }
            p class={ "mt-1 text-2xl font-semibold tabular-nums " (amount_style) }
                data-kpi-value
            {
                (format_currency(amount, currency_symbol))
            }
        }
    }
}
