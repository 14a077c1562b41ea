//! Foodgram API service
//!
//! Recipes, tags, the ingredient catalog, user accounts, favorites, the
//! shopping cart and author subscriptions over PostgreSQL. Access tokens are
//! issued by the auth service and verified here with its public key.
//!
//! The crate builds two binaries: `foodgram-api`, the HTTP server, and
//! `load_ingredients`, which imports the ingredient catalog from CSV.

pub mod config;
pub mod error;
pub mod images;
pub mod import;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod repositories;
pub mod routes;
pub mod shopping_list;
pub mod state;
pub mod validation;
