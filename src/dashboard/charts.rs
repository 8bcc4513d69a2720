//! Chart generation and rendering for the dashboard.
//!
//! Charts are built as ECharts options with `charming`, serialised to JSON
//! and initialised by a small script in the page head.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Line, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    aggregation::{Bucket, BucketTotals, CategoryTotal},
    html::HeadElement,
};

/// The ECharts build loaded on pages with charts.
pub(super) const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript that initialises each chart once the page has loaded,
/// following the system colour scheme and resizing with the window.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    if (!chartDom) {{ return; }}
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id,
                escape_script_text(&chart.options)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    HeadElement::ScriptSource(PreEscaped(format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    )))
}

/// Make chart options safe to embed in a `<script>` element.
///
/// User text such as a category name must not be able to close the element.
/// `<` is only escaped where it could start `</` or `<!--`, because the
/// options also hold formatter code such as `number < 0`. Both escapes sit
/// inside string literals, where `\/` and `\!` read as `/` and `!`.
fn escape_script_text(options: &str) -> String {
    options.replace("</", "<\\/").replace("<!--", "<\\!--")
}

/// Income, expense and net per bucket as three lines.
pub(super) fn cash_flow_chart(buckets: &[BucketTotals], bucket: Bucket, currency_symbol: &str) -> Chart {
    let labels: Vec<String> = buckets.iter().map(|totals| totals.label.clone()).collect();
    let income: Vec<f64> = buckets.iter().map(|totals| totals.income).collect();
    let expense: Vec<f64> = buckets.iter().map(|totals| totals.expense).collect();
    let net: Vec<f64> = buckets.iter().map(|totals| totals.net).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expense")
                .subtext(format!("{} totals", bucket.label())),
        )
        .tooltip(currency_tooltip(currency_symbol))
        .legend(Legend::new().right("4%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(80)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency_symbol))),
        )
        .series(Line::new().name("Income").data(income))
        .series(Line::new().name("Expense").data(expense))
        .series(Line::new().name("Net").data(net))
}

/// Share of spending per expense category as a donut.
pub(super) fn expense_donut_chart(totals: &[CategoryTotal], currency_symbol: &str) -> Chart {
    let data: Vec<(f64, &str)> = totals
        .iter()
        .map(|total| (total.total, total.name.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text("Expenses by Category"))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(currency_symbol)),
        )
        .legend(Legend::new().bottom("2%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "70%"])
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(data),
        )
}

fn currency_formatter(currency_symbol: &str) -> JsFunction {
    let symbol = serde_json::to_string(currency_symbol).unwrap_or_else(|_| "\"\"".to_owned());

    JsFunction::new_with_args(
        "number",
        &format!(
            "const formatter = new Intl.NumberFormat(undefined, {{
                minimumFractionDigits: 2,
                maximumFractionDigits: 2
            }});
            if (typeof number !== 'number') {{ return '-'; }}
            const sign = number < 0 ? '-' : '';
            return sign + {symbol} + formatter.format(Math.abs(number));"
        ),
    )
}

fn currency_tooltip(currency_symbol: &str) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter(currency_symbol))
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
