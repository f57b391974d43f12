//! One-shot threshold order
//!
//! Buys a single unit the first time a tick trades strictly below the
//! threshold, then ignores every later tick. Safe to share across threads:
//! the check, the buy, the transition and the notifications all run under
//! one lock, so exactly one caller ever reaches the order service and every
//! other caller returns only after that caller's subscribers have run.
//!
//! The lock is reentrant. A subscriber (or the order service itself) calling
//! back into the order on the same thread sees the buy in flight or the
//! terminal state and no-ops. A subscriber must not wait on another thread
//! that feeds this order.

use chrono::Utc;
use parking_lot::ReentrantMutex;
use rust_decimal::Decimal;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{SubscriptionId, Subscribers, panic_message};
use crate::core::{
    BUY_QUANTITY, Error, ErroredEvent, OrderService, OrderState, PlacedEvent, Result, Tick,
    TickHandler,
};
use crate::validation::{validate_order_input, validate_tick};

pub struct Order {
    id: Uuid,
    service: Arc<dyn OrderService>,
    price_threshold: Decimal,
    slot: ReentrantMutex<Slot>,
    placed: Subscribers<PlacedEvent>,
    errored: Subscribers<ErroredEvent>,
}

/// Guarded by the order lock. `Cell` because the reentrant guard only
/// hands out shared references.
#[derive(Default)]
struct Slot {
    state: Cell<OrderState>,
    buying: Cell<bool>,
}

impl Order {
    /// Fails with `Error::InvalidConfiguration` unless `price_threshold > 0`.
    pub fn new(service: Arc<dyn OrderService>, price_threshold: Decimal) -> Result<Self> {
        Self::builder()
            .service(service)
            .price_threshold(price_threshold)
            .build()
    }

    pub fn builder() -> OrderBuilder {
        OrderBuilder::default()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn price_threshold(&self) -> Decimal {
        self.price_threshold
    }

    pub fn state(&self) -> OrderState {
        self.slot.lock().state.get()
    }

    /// Register for successful buys.
    pub fn on_placed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PlacedEvent) + Send + Sync + 'static,
    {
        self.placed.subscribe(callback)
    }

    /// Register for failed buys.
    pub fn on_errored<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ErroredEvent) + Send + Sync + 'static,
    {
        self.errored.subscribe(callback)
    }

    pub fn unsubscribe_placed(&self, id: SubscriptionId) -> bool {
        self.placed.unsubscribe(id)
    }

    pub fn unsubscribe_errored(&self, id: SubscriptionId) -> bool {
        self.errored.unsubscribe(id)
    }

    /// Feed one tick.
    ///
    /// Returns `Err` only for malformed input. A failed buy moves the order
    /// to `Errored` and is reported through `on_errored`, never here.
    pub fn respond_to_tick(&self, code: &str, price: Decimal) -> Result<()> {
        self.handle_tick(Some(code), price)
    }

    /// Same as [`respond_to_tick`](Self::respond_to_tick) for a decoded tick.
    pub fn respond(&self, tick: &Tick) -> Result<()> {
        self.handle_tick(tick.code.as_deref(), tick.price)
    }

    fn handle_tick(&self, code: Option<&str>, price: Decimal) -> Result<()> {
        let code = validate_tick(code, price)?;

        let slot = self.slot.lock();

        let current = slot.state.get();
        if current.is_terminal() {
            debug!(order_id = %self.id, state = %current, "Ignoring tick {} @ {}", code, price);
            return Ok(());
        }
        if slot.buying.get() {
            debug!(order_id = %self.id, "Buy in flight, ignoring tick {} @ {}", code, price);
            return Ok(());
        }
        if price >= self.price_threshold {
            debug!(
                order_id = %self.id,
                "Tick {} @ {} not below threshold {}",
                code, price, self.price_threshold
            );
            return Ok(());
        }

        info!(
            order_id = %self.id,
            "Tick {} @ {} below threshold {}, buying {}",
            code, price, self.price_threshold, BUY_QUANTITY
        );
        slot.buying.set(true);
        let outcome = self.place_buy(code, price);
        slot.buying.set(false);
        slot.state.set(match outcome {
            Ok(()) => OrderState::Placed,
            Err(_) => OrderState::Errored,
        });

        // Still locked: other threads block until every subscriber has run.
        let failures = match outcome {
            Ok(()) => {
                info!(order_id = %self.id, "✅ Order placed: {} @ {}", code, price);
                self.placed.dispatch(&PlacedEvent {
                    order_id: self.id,
                    code: code.to_string(),
                    price,
                    at: Utc::now(),
                })
            }
            Err(e) => {
                warn!(order_id = %self.id, "❌ Order errored: {} @ {}: {}", code, price, e);
                self.errored.dispatch(&ErroredEvent {
                    order_id: self.id,
                    code: code.to_string(),
                    price,
                    error: Arc::new(e),
                    at: Utc::now(),
                })
            }
        };
        if failures > 0 {
            warn!(order_id = %self.id, failures, "{} subscriber(s) panicked", failures);
        }

        Ok(())
    }

    /// A panicking service counts as a failed buy.
    fn place_buy(&self, code: &str, price: Decimal) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.service.buy(code, BUY_QUANTITY, price)
        })) {
            Ok(result) => result,
            Err(payload) => Err(Error::Exchange(format!(
                "order service panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

impl TickHandler for Order {
    fn respond_to_tick(&self, code: &str, price: Decimal) -> Result<()> {
        Order::respond_to_tick(self, code, price)
    }

    fn respond(&self, tick: &Tick) -> Result<()> {
        Order::respond(self, tick)
    }
}

impl std::fmt::Debug for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Order")
            .field("id", &self.id)
            .field("price_threshold", &self.price_threshold)
            .field("state", &self.state())
            .field("placed", &self.placed)
            .field("errored", &self.errored)
            .finish()
    }
}

/// Builder for [`Order`]. Both fields are required.
#[derive(Default)]
pub struct OrderBuilder {
    service: Option<Arc<dyn OrderService>>,
    price_threshold: Option<Decimal>,
}

impl OrderBuilder {
    pub fn service(mut self, service: Arc<dyn OrderService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn price_threshold(mut self, price_threshold: Decimal) -> Self {
        self.price_threshold = Some(price_threshold);
        self
    }

    /// A missing service fails as "cannot be null"; a missing threshold
    /// fails the same way as a non-positive one.
    pub fn build(self) -> Result<Order> {
        let price_threshold = self.price_threshold.unwrap_or(Decimal::ZERO);
        let service = validate_order_input(self.service, price_threshold)?;

        Ok(Order {
            id: Uuid::new_v4(),
            service,
            price_threshold,
            slot: ReentrantMutex::new(Slot::default()),
            placed: Subscribers::new("placed"),
            errored: Subscribers::new("errored"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::PaperOrderService;
    use parking_lot::Mutex;
    use crate::validation::{
        CODE_EMPTY, CODE_NULL, PRICE_NOT_POSITIVE, SERVICE_NULL, THRESHOLD_NOT_POSITIVE,
    };
    use rust_decimal_macros::dec;

    struct PanickingService;

    impl OrderService for PanickingService {
        fn buy(&self, _: &str, _: u32, _: Decimal) -> Result<()> {
            panic!("venue exploded");
        }
        fn sell(&self, _: &str, _: u32, _: Decimal) -> Result<()> {
            Ok(())
        }
    }

    /// Feeds a tick back into its order from inside `buy`.
    #[derive(Default)]
    struct EchoService {
        order: Mutex<Option<Arc<Order>>>,
        buys: Mutex<usize>,
    }

    impl OrderService for EchoService {
        fn buy(&self, code: &str, _: u32, price: Decimal) -> Result<()> {
            *self.buys.lock() += 1;
            let order = self.order.lock().clone();
            if let Some(order) = order {
                order.respond_to_tick(code, price / Decimal::TWO)?;
            }
            Ok(())
        }
        fn sell(&self, _: &str, _: u32, _: Decimal) -> Result<()> {
            Ok(())
        }
    }

    fn order_with(venue: &Arc<PaperOrderService>) -> Order {
        Order::new(venue.clone(), dec!(100)).unwrap()
    }

    #[test]
    fn test_new_validates_threshold() {
        let venue = Arc::new(PaperOrderService::new());
        for bad in [dec!(0), dec!(-1)] {
            let err = Order::new(venue.clone(), bad).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(ref m) if m == THRESHOLD_NOT_POSITIVE));
        }
        let order = Order::new(venue, dec!(100)).unwrap();
        assert_eq!(order.state(), OrderState::Idle);
        assert_eq!(order.price_threshold(), dec!(100));
    }

    #[test]
    fn test_builder_requires_service() {
        let err = Order::builder().price_threshold(dec!(100)).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(ref m) if m == SERVICE_NULL));

        let err = Order::builder()
            .service(Arc::new(PaperOrderService::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(ref m) if m == THRESHOLD_NOT_POSITIVE));
    }

    #[test]
    fn test_below_threshold_buys_once() {
        let venue = Arc::new(PaperOrderService::new());
        let order = order_with(&venue);

        order.respond_to_tick("BOND", dec!(50)).unwrap();
        order.respond_to_tick("BOND", dec!(40)).unwrap();

        let fills = venue.fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].code, "BOND");
        assert_eq!(fills[0].quantity, 1);
        assert_eq!(fills[0].price, dec!(50));
        assert_eq!(order.state(), OrderState::Placed);
    }

    #[test]
    fn test_at_or_above_threshold_stays_idle() {
        let venue = Arc::new(PaperOrderService::new());
        let order = order_with(&venue);

        order.respond_to_tick("BOND", dec!(150)).unwrap();
        order.respond_to_tick("BOND", dec!(100)).unwrap();

        assert_eq!(venue.attempts(), 0);
        assert_eq!(order.state(), OrderState::Idle);

        // Still eligible
        order.respond_to_tick("BOND", dec!(99.99)).unwrap();
        assert_eq!(venue.attempts(), 1);
    }

    #[test]
    fn test_invalid_ticks_are_rejected_without_side_effects() {
        let venue = Arc::new(PaperOrderService::new());
        let order = order_with(&venue);
        let fired = Arc::new(Mutex::new(0));
        let f = fired.clone();
        order.on_placed(move |_| *f.lock() += 1);

        let empty = order.respond_to_tick("", dec!(50)).unwrap_err();
        assert!(matches!(empty, Error::InvalidInput(ref m) if m == CODE_EMPTY));

        let null = order.respond(&Tick { code: None, price: dec!(50) }).unwrap_err();
        assert!(matches!(null, Error::InvalidInput(ref m) if m == CODE_NULL));

        let price = order.respond_to_tick("BOND", dec!(0)).unwrap_err();
        assert!(matches!(price, Error::InvalidInput(ref m) if m == PRICE_NOT_POSITIVE));

        assert_eq!(venue.attempts(), 0);
        assert_eq!(*fired.lock(), 0);
        assert_eq!(order.state(), OrderState::Idle);
    }

    #[test]
    fn test_failed_buy_is_contained() {
        let venue = Arc::new(PaperOrderService::rejecting());
        let order = order_with(&venue);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        order.on_errored(move |e| s.lock().push((e.code.clone(), e.price, e.error.to_string())));

        assert!(order.respond_to_tick("BOND", dec!(50)).is_ok());
        assert!(order.respond_to_tick("BOND2", dec!(60)).is_ok());

        assert_eq!(order.state(), OrderState::Errored);
        assert_eq!(venue.attempts(), 1);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "BOND");
        assert_eq!(seen[0].1, dec!(50));
        assert!(seen[0].2.contains("rejected"));
    }

    #[test]
    fn test_panicking_service_counts_as_failure() {
        let order = Order::new(Arc::new(PanickingService), dec!(100)).unwrap();
        let errored = Arc::new(Mutex::new(None));
        let e = errored.clone();
        order.on_errored(move |ev| *e.lock() = Some(ev.error.to_string()));

        order.respond_to_tick("BOND", dec!(1)).unwrap();

        assert_eq!(order.state(), OrderState::Errored);
        let msg = errored.lock().clone().unwrap();
        assert!(msg.contains("venue exploded"));
    }

    #[test]
    fn test_events_carry_order_id() {
        let venue = Arc::new(PaperOrderService::new());
        let order = order_with(&venue);
        let ids = Arc::new(Mutex::new(Vec::new()));
        let i = ids.clone();
        order.on_placed(move |e| i.lock().push(e.order_id));

        order.respond_to_tick("BOND", dec!(1)).unwrap();
        assert_eq!(*ids.lock(), vec![order.id()]);
    }

    #[test]
    fn test_subscriber_may_reenter_order() {
        let venue = Arc::new(PaperOrderService::new());
        let order = Arc::new(order_with(&venue));
        let inner = order.clone();
        order.on_placed(move |_| {
            // Terminal already, so this is a no-op rather than a deadlock
            inner.respond_to_tick("BOND", dec!(1)).unwrap();
        });

        order.respond_to_tick("BOND", dec!(50)).unwrap();
        assert_eq!(venue.attempts(), 1);
    }

    #[test]
    fn test_service_reentry_during_buy_is_ignored() {
        let service = Arc::new(EchoService::default());
        let order = Arc::new(Order::new(service.clone(), dec!(100)).unwrap());
        *service.order.lock() = Some(order.clone());

        order.respond_to_tick("BOND", dec!(50)).unwrap();

        assert_eq!(*service.buys.lock(), 1);
        assert_eq!(order.state(), OrderState::Placed);
        service.order.lock().take();
    }

    #[test]
    fn test_subscriber_sees_terminal_state() {
        let venue = Arc::new(PaperOrderService::rejecting());
        let order = Arc::new(order_with(&venue));
        let seen = Arc::new(Mutex::new(None));
        let (inner, s) = (order.clone(), seen.clone());
        order.on_errored(move |_| *s.lock() = Some(inner.state()));

        order.respond_to_tick("BOND", dec!(50)).unwrap();
        assert_eq!(*seen.lock(), Some(OrderState::Errored));
    }
}
