mod api;

pub use api::LedgerApi;
