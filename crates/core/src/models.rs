use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// EA identifier used whenever a caller omits `ea_id`, on every route.
pub const DEFAULT_EA_ID: &str = "TEST_EA";

// ---------------------------------------------------------------------------
// Order types
// ---------------------------------------------------------------------------

/// The kind of order an EA is asked to place.
///
/// `Buy`/`Sell` execute at market; the limit and stop variants are pending
/// orders and need a trigger price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
}

impl OrderType {
    pub const ALL: [OrderType; 6] = [
        OrderType::Buy,
        OrderType::Sell,
        OrderType::BuyLimit,
        OrderType::SellLimit,
        OrderType::BuyStop,
        OrderType::SellStop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "BUY",
            OrderType::Sell => "SELL",
            OrderType::BuyLimit => "BUY_LIMIT",
            OrderType::SellLimit => "SELL_LIMIT",
            OrderType::BuyStop => "BUY_STOP",
            OrderType::SellStop => "SELL_STOP",
        }
    }

    /// Pending orders rest at a price instead of filling at market.
    pub fn is_pending(&self) -> bool {
        !matches!(self, OrderType::Buy | OrderType::Sell)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known order type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderType(pub String);

impl FromStr for OrderType {
    type Err = UnknownOrderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        OrderType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownOrderType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Lifecycle state of a queued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Delivered,
    Expired,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::Pending)
    }
}

/// A trading instruction queued for one EA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command_id")]
    pub id: Uuid,
    pub ea_id: String,
    pub symbol: String,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
    /// Trigger price; always `None` for market orders.
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub stop_loss: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub take_profit: Option<Decimal>,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub status: CommandStatus,
}

impl Command {
    pub fn is_pending(&self) -> bool {
        self.status == CommandStatus::Pending
    }

    /// Copy of this command in a terminal state.
    pub fn with_status(&self, status: CommandStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// A validated order that has not been queued yet.
///
/// Produced by [`crate::validate_and_normalize`]; the queue assigns identity
/// through [`NewCommand::into_command`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommand {
    pub ea_id: String,
    pub symbol: String,
    pub order_type: OrderType,
    pub volume: Decimal,
    pub price: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub comment: String,
}

impl NewCommand {
    pub fn into_command(self) -> Command {
        Command {
            id: Uuid::new_v4(),
            ea_id: self.ea_id,
            symbol: self.symbol,
            order_type: self.order_type,
            volume: self.volume,
            price: self.price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            comment: self.comment,
            created_at: Utc::now(),
            status: CommandStatus::Pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire requests
// ---------------------------------------------------------------------------

/// Body of an "open position" submission, as sent by clients.
///
/// `order_type` stays a string here so an unknown value surfaces as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub ea_id: Option<String>,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub order_type: String,
    pub volume: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub comment: Option<String>,
}
