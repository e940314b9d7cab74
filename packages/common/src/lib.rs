pub mod error;
pub mod ids;
pub mod result;
pub mod storage;

pub use error::*;
pub use ids::*;
pub use result::*;
pub use storage::*;
