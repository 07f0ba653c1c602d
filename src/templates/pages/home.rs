// templates/pages/home.rs

use crate::config::{AppConfig, ThresholdSet};
use crate::db::runs::CleaningRun;
use crate::templates::{
    components::{card, field, status_badge, yes_no},
    desktop_layout,
};
use maud::{html, Markup};

pub struct HomeVm<'a> {
    pub config: &'a AppConfig,
    pub recent_runs: &'a [CleaningRun],
}

fn threshold_fields(prefix: &str, set: &ThresholdSet) -> Markup {
    html! {
        div class="grid" {
            @for key in ThresholdSet::KEYS {
                @let value = set.get(key).map(|v| v.to_string()).unwrap_or_default();
                (field(key, &format!("{prefix}.{key}"), &value))
            }
        }
    }
}

pub fn home_page(vm: &HomeVm) -> Markup {
    let search = &vm.config.search;
    let logic = &vm.config.logic;
    let general = &vm.config.general;
    let min_bedrooms = general.min_bedrooms.map(|v| v.to_string()).unwrap_or_default();

    desktop_layout(
        "Listing Quality",
        None,
        html! {
            h1 { "Rental listing quality" }

            form action="/runs" method="post" {
                (card("Search", html! {
                    div class="grid" {
                        (field("Location", "location_query", &search.location_query))
                        (field("Max listings", "max_listings", &search.max_listings.to_string()))
                        (field("Max reviews", "max_reviews", &search.max_reviews.to_string()))
                        (field("Calendar months", "calendar_months", &search.calendar_months.to_string()))
                        (field("Currency", "currency", &search.currency))
                        (field("Check in", "check_in", &search.check_in))
                        (field("Check out", "check_out", &search.check_out))
                        (field("Limit points", "limit_points", &search.limit_points.to_string()))
                        (yes_no("Include reviews", "include_reviews", search.include_reviews))
                        (yes_no("More host info", "add_more_host_info", search.add_more_host_info))
                    }
                    label for="start_urls" { "Start URLs (one per line, overrides location)" }
                    textarea id="start_urls" name="start_urls" rows="3" cols="80" {
                        (search.start_urls.join("\n"))
                    }
                }))

                (card("Good Data", threshold_fields("good", &logic.good_data)))
                (card("Possibly Good Data", threshold_fields("possibly_good", &logic.possibly_good_data)))

                (card("General", html! {
                    div class="grid" {
                        (field("Minimum bedrooms", "min_bedrooms", &min_bedrooms))
                        (field("High season override (Q1-Q4)", "high_season_override", &logic.high_season_override))
                        (field("Output file name", "output_file_name", &general.output_file_name))
                        div {
                            label for="output_file_format" { "Output format" }
                            select id="output_file_format" name="output_file_format" {
                                option value="csv" selected[general.output_file_format == "csv"] { "CSV" }
                                option value="excel" selected[general.output_file_format != "csv"] { "Excel" }
                            }
                        }
                    }
                    p { small { "Empty thresholds are not checked." } }
                }))

                button type="submit" { "Save and run" }
            }

            @if !vm.recent_runs.is_empty() {
                (card("Recent runs", html! {
                    table {
                        thead {
                            tr {
                                th { "ID" }
                                th { "Started" }
                                th { "Status" }
                                th { "Listings" }
                                th { "Format" }
                            }
                        }
                        tbody {
                            @for run in vm.recent_runs {
                                tr {
                                    td { a href=(format!("/runs/{}", run.id)) { "#" (run.id) } }
                                    td { (run.started_at.format("%Y-%m-%d %H:%M").to_string()) }
                                    td { (status_badge(run.status.as_str())) }
                                    td {
                                        @match run.listings_seen {
                                            Some(n) => (n),
                                            None => "-",
                                        }
                                    }
                                    td { (run.output_format) }
                                }
                            }
                        }
                    }
                }))
            }
        },
    )
}
