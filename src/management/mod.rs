mod auth;
mod catalog;
mod selection;

pub use auth::TokenExchange;
pub use auth::TokenManager;
pub use catalog::CatalogCache;
pub use selection::Selection;
pub use selection::SelectionModel;
pub use selection::SelectionOp;
