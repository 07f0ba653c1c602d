use crate::templates::desktop_layout;
use maud::{html, Markup};

/// Body of every error response.
pub fn error_page(status: u16, message: &str) -> Markup {
    desktop_layout(
        &format!("Error {status}"),
        None,
        html! {
            h1 { "Error " (status) }
            p { (message) }
            p { a href="/" { "← Back to home" } }
        },
    )
}
