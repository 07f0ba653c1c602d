// templates/pages/run.rs

use crate::cleaning::OutputTable;
use crate::db::results::StoredFailure;
use crate::db::runs::{CleaningRun, RunStatus};
use crate::domain::value_text;
use crate::templates::{
    components::{card, status_badge},
    desktop_layout,
};
use maud::{html, Markup};

const PREVIEW_ROWS: usize = 25;

pub struct RunVm<'a> {
    pub run: &'a CleaningRun,
    pub table: Option<&'a OutputTable>,
    pub category_counts: &'a [(String, i64)],
    pub failures: &'a [StoredFailure],
}

pub fn run_page(vm: &RunVm) -> Markup {
    let run = vm.run;
    let refresh = (run.status == RunStatus::Running).then_some(2);

    desktop_layout(
        &format!("Run #{}", run.id),
        refresh,
        html! {
            h1 { "Run #" (run.id) " " (status_badge(run.status.as_str())) }

            (card("Summary", html! {
                table {
                    tr { th { "Started" } td { (run.started_at.format("%Y-%m-%d %H:%M:%S").to_string()) } }
                    @if let Some(finished) = run.finished_at {
                        tr { th { "Finished" } td { (finished.format("%Y-%m-%d %H:%M:%S").to_string()) } }
                    }
                    @if let Some(seen) = run.listings_seen {
                        tr { th { "Listings" } td { (seen) } }
                    }
                    @if let Some(failed) = run.listings_failed {
                        tr { th { "Skipped" } td { (failed) } }
                    }
                    tr {
                        th { "High season" }
                        td {
                            @match run.high_season {
                                Some(q) => { "Q" (q) " (" (run.high_season_reviews.unwrap_or(0)) " reviews)" }
                                None => "None",
                            }
                        }
                    }
                    @for (category, count) in vm.category_counts {
                        tr { th { (category) } td { (count) } }
                    }
                }
                @if let Some(err) = &run.error_message {
                    p class="status-failed" { (err) }
                }
                @if run.status == RunStatus::Running {
                    p { "Cleaning in progress, this page refreshes automatically." }
                }
            }))

            @if let Some(table) = vm.table {
                (card("Results", html! {
                    p {
                        a href=(format!("/runs/{}/download", run.id)) {
                            "Download " (run.output_file_name) " (" (run.output_format) ")"
                        }
                    }
                    table {
                        thead {
                            tr {
                                th { "Listing" }
                                th { "Category" }
                                th { "Reviews" }
                                th { "Months" }
                                th { "Missing" }
                                th { "Avg / month" }
                                th { "High season" }
                                th { "Reason" }
                            }
                        }
                        tbody {
                            @for row in table.rows().iter().take(PREVIEW_ROWS) {
                                tr {
                                    td {
                                        @match row.url.as_ref().and_then(value_text) {
                                            Some(url) => a href=(url) { (row.listing_name) },
                                            None => (row.listing_name),
                                        }
                                    }
                                    td { (row.tier.label()) }
                                    td { (row.total_reviews) }
                                    td { (row.total_months) }
                                    td { (row.missing_months) }
                                    td { (row.avg_reviews_per_month) }
                                    td { (row.high_season_insights) }
                                    td { (row.reason) }
                                }
                            }
                        }
                    }
                    @if table.len() > PREVIEW_ROWS {
                        p { small { "Showing " (PREVIEW_ROWS) " of " (table.len()) " listings." } }
                    }
                }))
            }

            @if !vm.failures.is_empty() {
                (card("Skipped listings", html! {
                    table {
                        thead { tr { th { "#" } th { "Listing" } th { "Error" } } }
                        tbody {
                            @for failure in vm.failures {
                                tr {
                                    td { (failure.position) }
                                    td { (failure.listing_name) }
                                    td { (failure.error) }
                                }
                            }
                        }
                    }
                }))
            }
        },
    )
}
