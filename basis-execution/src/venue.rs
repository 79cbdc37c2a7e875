//! Runtime venue handle: static spec, mutable position, execution client.

use crate::client::ExecutionClient;
use basis_instrument::{VenueId, VenueSpec};
use std::fmt;
use std::sync::{Arc, RwLock};

/// A venue as seen by the strategy and the fill-or-kill executor.
///
/// `position` is the venue's signed inventory in crypto units (long
/// positive). It is only ever written from the fill-or-kill path bound to
/// this venue; the strategy reads it between snapshots, and a read that lags
/// one snapshot is acceptable.
pub struct VenueHandle {
    spec: VenueSpec,
    position: RwLock<f64>,
    client: Arc<dyn ExecutionClient>,
}

impl VenueHandle {
    pub fn new(spec: VenueSpec, client: Arc<dyn ExecutionClient>) -> Self {
        Self {
            spec,
            position: RwLock::new(0.0),
            client,
        }
    }

    pub fn id(&self) -> &VenueId {
        &self.spec.id
    }

    pub fn spec(&self) -> &VenueSpec {
        &self.spec
    }

    pub fn client(&self) -> &dyn ExecutionClient {
        self.client.as_ref()
    }

    pub fn position(&self) -> f64 {
        *self.position.read().unwrap()
    }

    pub fn set_position(&self, position: f64) {
        *self.position.write().unwrap() = position;
    }

    /// Quantity this venue can still sell before hitting the short cap.
    pub fn able_to_sell(&self) -> f64 {
        self.position() + self.spec.max_position
    }

    /// Quantity this venue can still buy before hitting the long cap.
    pub fn able_to_buy(&self) -> f64 {
        self.spec.max_position - self.position()
    }
}

impl fmt::Display for VenueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.spec, f)
    }
}

impl fmt::Debug for VenueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueHandle")
            .field("id", &self.spec.id)
            .field("position", &self.position())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockExecution;
    use smol_str::SmolStr;

    fn handle(max_position: f64) -> VenueHandle {
        VenueHandle::new(
            VenueSpec {
                id: VenueId::from("mock"),
                name: SmolStr::new("Mock(usd)"),
                symbol: SmolStr::new("ltc"),
                currency: "usd".into(),
                priority: 1,
                fee: 0.002,
                max_position,
                avail_funds: 0.0,
                avail_short: 0.0,
                has_crypto_fee: false,
            },
            Arc::new(MockExecution::new()),
        )
    }

    #[test]
    fn test_position_starts_flat_and_updates() {
        let venue = handle(500.0);
        assert_eq!(venue.position(), 0.0);
        venue.set_position(10.0);
        assert_eq!(venue.position(), 10.0);
    }

    #[test]
    fn test_capacity_tracks_position() {
        let venue = handle(500.0);
        venue.set_position(-250.0);
        assert_eq!(venue.able_to_sell(), 250.0);
        assert_eq!(venue.able_to_buy(), 750.0);
    }
}
