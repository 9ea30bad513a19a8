use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Money, OrderId, ProductId, UserId};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processed => "processed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// The transition table. Everything not listed here is rejected.
    pub fn successors(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processed, OrderStatus::Cancelled],
            OrderStatus::Processed => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processed" => Ok(OrderStatus::Processed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// A user's request to purchase a quantity of one product.
///
/// # Invariants
/// - `quantity` > 0.
/// - An order only ever comes into existence alongside a successful stock
///   decrement (see [`crate::OrderWorkflow::place_order`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
        ordered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        Ok(Self {
            id,
            user_id,
            product_id,
            quantity,
            status: OrderStatus::Pending,
            ordered_at,
        })
    }

    /// Only pending orders can still be edited or deleted.
    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }

    /// Exact total: unit price times quantity. `None` on overflow.
    pub fn total(&self, unit_price: Money) -> Option<Money> {
        unit_price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn test_order(quantity: i64) -> DomainResult<Order> {
        Order::new(
            OrderId::new(),
            UserId::new(),
            ProductId::new(),
            quantity,
            Utc::now(),
        )
    }

    #[test]
    fn new_order_starts_pending() {
        let order = test_order(3).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.is_modifiable());
    }

    #[test]
    fn new_order_rejects_non_positive_quantity() {
        assert!(test_order(0).is_err());
        assert!(test_order(-4).is_err());
    }

    #[test]
    fn total_is_exact() {
        let order = test_order(3).unwrap();
        let total = order.total("19.99".parse().unwrap()).unwrap();
        assert_eq!(total.to_string(), "59.97");
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processed.can_transition_to(Shipped));
        assert!(Processed.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
    }

    #[test]
    fn delivered_and_cancelled_are_terminal() {
        for status in ALL_STATUSES {
            assert_eq!(
                status.is_terminal(),
                matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
            );
        }
    }

    #[test]
    fn status_parses_from_its_display_form() {
        for status in ALL_STATUSES {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("draft".parse::<OrderStatus>().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = OrderStatus> {
            proptest::sample::select(ALL_STATUSES.to_vec())
        }

        proptest! {
            /// No sequence of allowed transitions ever leaves a terminal state.
            #[test]
            fn terminal_states_absorb(sequence in proptest::collection::vec(any_status(), 1..20)) {
                let mut current = OrderStatus::Pending;
                for next in sequence {
                    let was_terminal = current.is_terminal();
                    if current.can_transition_to(next) {
                        prop_assert!(!was_terminal);
                        current = next;
                    }
                }
            }

            /// The transition predicate agrees with the successor table.
            #[test]
            fn predicate_matches_table(from in any_status(), to in any_status()) {
                prop_assert_eq!(
                    from.can_transition_to(to),
                    from.successors().contains(&to)
                );
            }
        }
    }
}
