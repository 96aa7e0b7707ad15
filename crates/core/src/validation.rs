use crate::models::*;
use rust_decimal::Decimal;

/// Reasons an order request is refused before it reaches a queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("unknown order type '{0}' (expected one of BUY, SELL, BUY_LIMIT, SELL_LIMIT, BUY_STOP, SELL_STOP)")]
    UnknownOrderType(String),
    #[error("volume must be a positive number")]
    NonPositiveVolume,
    #[error("price is required for {0} orders")]
    MissingPrice(OrderType),
    #[error("{0} must be a positive number")]
    NonPositivePrice(&'static str),
}

impl From<UnknownOrderType> for ValidationError {
    fn from(err: UnknownOrderType) -> Self {
        ValidationError::UnknownOrderType(err.0)
    }
}

/// Resolve a caller-supplied EA id, falling back to `default_ea_id` when it is
/// absent or blank. Every route goes through here so defaults cannot drift.
pub fn resolve_ea_id(ea_id: Option<&str>, default_ea_id: &str) -> String {
    match ea_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => default_ea_id.to_string(),
    }
}

/// Check an order request and fill in defaults.
///
/// Market orders drop any supplied price; pending orders require one.
pub fn validate_and_normalize(
    request: OrderRequest,
    default_ea_id: &str,
) -> Result<NewCommand, ValidationError> {
    let symbol = request.symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }

    let order_type: OrderType = request.order_type.parse()?;

    if request.volume <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveVolume);
    }

    let price = if order_type.is_pending() {
        match request.price {
            Some(p) => Some(positive(p, "price")?),
            None => return Err(ValidationError::MissingPrice(order_type)),
        }
    } else {
        None
    };

    let stop_loss = request
        .stop_loss
        .map(|p| positive(p, "stop_loss"))
        .transpose()?;
    let take_profit = request
        .take_profit
        .map(|p| positive(p, "take_profit"))
        .transpose()?;

    Ok(NewCommand {
        ea_id: resolve_ea_id(request.ea_id.as_deref(), default_ea_id),
        symbol: symbol.to_string(),
        order_type,
        volume: request.volume,
        price,
        stop_loss,
        take_profit,
        comment: request.comment.unwrap_or_default(),
    })
}

fn positive(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    if value > Decimal::ZERO {
        Ok(value)
    } else {
        Err(ValidationError::NonPositivePrice(field))
    }
}
