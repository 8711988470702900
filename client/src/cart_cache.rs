use parking_lot::Mutex;
use tracing::debug;

use crate::types::Cart;

/// Why a cached cart was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
  CartChanged,
  OrderPlaced,
  SessionStarted,
  SessionEnded,
}

/// Last cart fetched from the server. Any call that can change the cart on
/// the server side drops it, so a hit is never older than the last mutation
/// made through this client.
#[derive(Debug, Default)]
pub struct CartCache {
  cart: Mutex<Option<Cart>>,
}

impl CartCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self) -> Option<Cart> {
    self.cart.lock().clone()
  }

  pub fn store(&self, cart: Cart) {
    *self.cart.lock() = Some(cart);
  }

  pub fn invalidate(&self, reason: Invalidation) {
    if self.cart.lock().take().is_some() {
      debug!(?reason, "Cart cache invalidated.");
    }
  }

  pub fn is_cached(&self) -> bool {
    self.cart.lock().is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn empty_cart() -> Cart {
    Cart {
      items: Vec::new(),
      total_quantity: 0,
      subtotal: Decimal::ZERO,
    }
  }

  #[test]
  fn every_invalidation_drops_the_cart() {
    let cache = CartCache::new();
    for reason in [
      Invalidation::CartChanged,
      Invalidation::OrderPlaced,
      Invalidation::SessionStarted,
      Invalidation::SessionEnded,
    ] {
      cache.store(empty_cart());
      assert!(cache.is_cached());
      cache.invalidate(reason);
      assert!(cache.get().is_none(), "{:?} kept the cart", reason);
    }
  }

  #[test]
  fn invalidating_an_empty_cache_is_harmless() {
    let cache = CartCache::new();
    cache.invalidate(Invalidation::SessionEnded);
    assert!(!cache.is_cached());
  }
}
