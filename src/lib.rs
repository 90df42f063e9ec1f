pub mod api;
pub mod error;
pub mod fields;
pub mod remote;
pub mod services;
pub mod signals;
pub mod state;
pub mod store;
pub mod types;
pub mod util;
pub mod validation;
pub mod vocabulary;
