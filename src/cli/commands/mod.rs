//! CLI command implementations.

mod add;
mod config;
mod context;
mod edit;
mod init;
mod list;
mod remove;
mod route;
mod search;
mod show;

pub use add::{run_add, AddArgs};
pub use config::run_config;
pub use context::run_context;
pub use edit::{run_edit, EditArgs};
pub use init::run_init;
pub use list::run_list;
pub use remove::run_remove;
pub use route::{run_route, RouteArgs};
pub use search::run_search;
pub use show::run_show;
