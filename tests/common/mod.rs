#![allow(dead_code)]

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tick_order::{Error, ErroredEvent, Order, OrderService, PlacedEvent, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub code: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Order service double: records calls, optionally fails or stalls.
#[derive(Default)]
pub struct MockOrderService {
    pub buys: Mutex<Vec<Call>>,
    pub sells: Mutex<Vec<Call>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl MockOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn buy_calls(&self) -> Vec<Call> {
        self.buys.lock().clone()
    }
}

impl OrderService for MockOrderService {
    fn buy(&self, code: &str, quantity: u32, price: Decimal) -> Result<()> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.buys.lock().push(Call {
            code: code.to_string(),
            quantity,
            price,
        });
        match &self.fail_with {
            Some(reason) => Err(Error::Exchange(reason.clone())),
            None => Ok(()),
        }
    }

    fn sell(&self, code: &str, quantity: u32, price: Decimal) -> Result<()> {
        self.sells.lock().push(Call {
            code: code.to_string(),
            quantity,
            price,
        });
        Ok(())
    }
}

/// Everything an order announced.
#[derive(Default)]
pub struct Recorder {
    pub placed: Mutex<Vec<PlacedEvent>>,
    pub errored: Mutex<Vec<ErroredEvent>>,
}

impl Recorder {
    pub fn attach(order: &Order) -> Arc<Self> {
        let recorder = Arc::new(Self::default());
        let r = recorder.clone();
        order.on_placed(move |e| r.placed.lock().push(e.clone()));
        let r = recorder.clone();
        order.on_errored(move |e| r.errored.lock().push(e.clone()));
        recorder
    }

    pub fn total(&self) -> usize {
        self.placed.lock().len() + self.errored.lock().len()
    }
}
