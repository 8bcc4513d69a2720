//! Downloads the Profit & Loss report as CSV.
use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use csv::Writer;

use crate::{
    Error,
    auth::CurrentUser,
    report::{
        page::{ReportState, load_report},
        statement::{ProfitAndLoss, ReportQuery},
    },
};

/// Write the category rows of `report` followed by the grand total.
///
/// Rows are `category,kind,total` with totals to two decimal places. The
/// final row is `Total,Net,<income - expense>`.
///
/// # Errors
/// Returns [Error::CsvError] if a row could not be written.
pub fn write_report_csv(report: &ProfitAndLoss) -> Result<Vec<u8>, Error> {
    let mut writer = Writer::from_writer(Vec::new());

    writer.write_record(["category", "kind", "total"])?;

    for row in report.rows() {
        let total = format!("{:.2}", row.total);
        writer.write_record([row.name.as_str(), row.kind.as_str(), total.as_str()])?;
    }

    let net = format!("{:.2}", report.kpis.net);
    writer.write_record(["Total", "Net", net.as_str()])?;

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

/// Download the report for the requested range as a CSV attachment.
pub async fn export_report_csv(
    State(state): State<ReportState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let report = load_report(&state, &user, &query)?;
    let body = write_report_csv(&report)?;

    tracing::debug!(
        "exported report from {} to {} for user {}",
        report.date_from,
        report.date_to,
        user.id
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.csv_file_name()),
            ),
        ],
        body,
    )
        .into_response())
}
