pub mod errors;
pub mod file;
pub mod html;

pub use errors::{error_response, ResultResp};
pub use file::export_response;
pub use html::{html_response, redirect};
