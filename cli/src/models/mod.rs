pub mod api;
pub mod prediction;
pub mod price_point;
pub mod schema;
pub mod symbol;

pub use api::*;
pub use prediction::*;
pub use price_point::*;
pub use schema::*;
pub use symbol::*;
