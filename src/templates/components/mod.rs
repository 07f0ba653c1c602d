use maud::{html, Markup};

pub mod error;

pub use error::error_page;

pub fn card(title: &str, body: Markup) -> Markup {
    html! {
        div class="card" {
            h2 { (title) }
            div class="card-body" {
                (body)
            }
        }
    }
}

/// Labelled text input.
pub fn field(label: &str, name: &str, value: &str) -> Markup {
    html! {
        div {
            label for=(name) { (label) }
            input type="text" id=(name) name=(name) value=(value);
        }
    }
}

/// true/false select; a select always submits, unlike an unchecked checkbox.
pub fn yes_no(label: &str, name: &str, value: bool) -> Markup {
    html! {
        div {
            label for=(name) { (label) }
            select id=(name) name=(name) {
                option value="true" selected[value] { "Yes" }
                option value="false" selected[!value] { "No" }
            }
        }
    }
}

pub fn status_badge(status: &str) -> Markup {
    html! {
        strong class=(format!("status-{status}")) { (status) }
    }
}
