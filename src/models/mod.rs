pub mod metadata;
pub mod request;
pub mod response;

pub use metadata::*;
pub use request::*;
pub use response::*;
