pub mod home;
pub mod run;

pub use home::{home_page, HomeVm};
pub use run::{run_page, RunVm};
