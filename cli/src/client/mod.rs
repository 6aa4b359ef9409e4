//! Client side of the stock screen: where data comes from and what the
//! user currently sees

pub mod backend;
pub mod http;
pub mod render;
pub mod view;

pub use backend::{LocalBackend, StockBackend};
pub use http::{HttpBackend, DEFAULT_BASE_URL};
pub use render::{render_chart, render_prediction, render_summary, render_view};
pub use view::{ClientView, MAX_SUGGESTIONS};
