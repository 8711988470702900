//! Client for the MobileShop API.
//!
//! [`ApiClient`] keeps the session tokens in a [`SessionStore`], retries an
//! authorized call once after refreshing the session, and caches the cart in a
//! [`CartCache`] that every cart-changing call invalidates.

pub mod cart_cache;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use cart_cache::{CartCache, Invalidation};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{SessionStore, SessionTokens};
