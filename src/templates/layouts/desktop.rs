use maud::{html, Markup, DOCTYPE};

/// Page shell. `refresh_secs` reloads the page periodically (used while a run is going).
pub fn desktop_layout(title: &str, refresh_secs: Option<u32>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if let Some(secs) = refresh_secs {
                    meta http-equiv="refresh" content=(secs);
                }
                title { (title) }
                style { (STYLES) }
            }
            body {
              header class="flex items-center justify-between px-6 py-3 shadow" {
                  h3 { "Listing Quality" }
                  nav {
                      ul {
                          li { a href="/" { "Home" } }
                      }
                  }
              }
                main class="container" {
                    (content)
                }
            }
        }
    }
}

const STYLES: &str = "
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
header { display: flex; justify-content: space-between; align-items: center; padding: 0.75rem 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
header ul { list-style: none; margin: 0; padding: 0; }
.container { max-width: 1100px; margin: 2rem auto; padding: 0 1rem; }
.card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem 1.5rem; margin-bottom: 1.5rem; }
table { width: 100%; border-collapse: collapse; font-size: 0.9em; }
th, td { padding: 6px 8px; border-bottom: 1px solid #f3f4f6; text-align: left; vertical-align: top; }
label { display: block; margin: 0.5rem 0 0.2rem; font-weight: 500; }
input, select, textarea { padding: 4px 6px; border: 1px solid #ccc; border-radius: 4px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 0 1rem; }
.status-running { color: #b45309; }
.status-completed { color: #047857; }
.status-failed { color: #b91c1c; }
";
