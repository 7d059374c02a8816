pub mod model;
pub mod title;
pub mod validate;

pub use model::{AlternateLanguage, Document};
