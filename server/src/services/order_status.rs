//! The single place that decides whether an order may move between statuses.

use crate::errors::AppError;
use crate::models::OrderStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
  /// Any status may follow any status.
  #[default]
  Permissive,
  /// PENDING → CONFIRMED → SHIPPED → DELIVERED, with cancellation before shipping.
  Lifecycle,
}

impl std::str::FromStr for TransitionPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "permissive" => Ok(TransitionPolicy::Permissive),
      "lifecycle" => Ok(TransitionPolicy::Lifecycle),
      other => Err(format!("Invalid ORDER_TRANSITION_POLICY '{}'", other)),
    }
  }
}

impl TransitionPolicy {
  pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match self {
      TransitionPolicy::Permissive => true,
      TransitionPolicy::Lifecycle => matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Shipped) | (Confirmed, Cancelled) | (Shipped, Delivered)
      ),
    }
  }

  pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), AppError> {
    if self.allows(from, to) {
      Ok(())
    } else {
      Err(AppError::Validation(format!("Cannot change order status from {} to {}", from, to)))
    }
  }
}
