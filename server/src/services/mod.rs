//! Business operations outside the multi-step pipelines.

pub mod account_service;
pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_number;
pub mod order_service;
pub mod order_status;
pub mod password_service;
pub mod token_service;
