pub mod config;
pub mod environment;
pub mod errors;
pub mod identity;
pub mod ordering;
pub mod record;
pub mod reference;
pub mod repository;
pub mod routes;
pub mod store;
