//! Fill-or-kill: send a limit order, poll it, cancel it if still live, and
//! report the quantity that actually filled.

use crate::venue::VenueHandle;
use basis_instrument::{OrderState, OrderType, Side};
use tracing::{info, warn};

/// Run one order through the fill-or-kill state machine and apply the fill to
/// the venue position.
///
/// Submission retries until the venue hands back a non-zero order id; polling
/// re-issues a best-effort cancel whenever the order is still live and
/// re-polls through transient `Unknown` states until the order is dead. Any
/// fill race with the cancel shows up as a dead order with a non-zero filled
/// amount, so the loop always converges.
///
/// Returns the signed-magnitude quantity applied to the position: the raw
/// fill for sells, and the fill net of the crypto-denominated fee for buys on
/// venues that charge one.
pub async fn fill_or_kill(venue: &VenueHandle, action: Side, amount: f64, price: f64) -> f64 {
    let client = venue.client();

    // Submit until the venue assigns an id.
    let id = loop {
        match client.send_order(action, OrderType::Limit, amount, price).await {
            Ok(id) if id > 0 => break id,
            Ok(_) => warn!(venue = %venue, "send_order returned zero id, resending"),
            Err(error) => warn!(venue = %venue, %error, "send_order failed, resending"),
        }
    };

    // Poll until dead, cancelling while live.
    let filled = loop {
        let status = match client.order_status(id).await {
            Ok(status) => status,
            Err(error) => {
                warn!(venue = %venue, order_id = id, %error, "order_status failed, repolling");
                continue;
            }
        };
        match status.state {
            OrderState::Live => {
                if let Err(error) = client.cancel_order(id).await {
                    warn!(venue = %venue, order_id = id, %error, "cancel_order failed");
                }
            }
            OrderState::Unknown => continue,
            OrderState::Dead => break status.filled_amount,
        }
    };

    // Apply the fill to the venue position. Buys on crypto-fee venues receive
    // less than the filled quantity.
    let applied = match action {
        Side::Buy => {
            let delta = if venue.spec().has_crypto_fee {
                filled * (1.0 - venue.spec().fee)
            } else {
                filled
            };
            venue.set_position(venue.position() + delta);
            delta
        }
        Side::Sell => {
            venue.set_position(venue.position() - filled);
            filled
        }
    };

    info!(venue = %venue, side = %action, qty = filled, price, "trade");
    applied
}
