//! MobileShop storefront API: catalog, cart, orders, accounts and the admin console.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
