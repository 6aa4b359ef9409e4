pub mod catalog;
pub mod company_directory;
pub mod history_reader;
pub mod prediction_bridge;
pub mod predictor;

pub use catalog::*;
pub use company_directory::*;
pub use history_reader::*;
pub use prediction_bridge::*;
pub use predictor::*;
