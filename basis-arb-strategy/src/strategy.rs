//! The arbitrage decision logic.
//!
//! On every snapshot the strategy first tries to exit any net position (hit
//! the best bid when long, lift the best ask when short), and otherwise scans
//! all ordered venue pairs for an entry whose spread clears the
//! position-aware needed-arb threshold. Selected trades go out as paired
//! fill-or-kill orders sequenced by venue priority.

use crate::display;
use crate::filter::Market;
use crate::hub::Snapshot;
use basis_execution::{fok::fill_or_kill, VenueHandle};
use basis_instrument::Side;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Tolerance for float comparisons in the repeat-suppression logic.
const REPEAT_TOL: f64 = 1e-6;

/// Strategy parameters, straight from the engine config.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    /// Upper bound of the needed-arb band.
    pub max_arb: f64,
    /// Lower bound of the needed-arb band.
    pub min_arb: f64,
    /// Added to the band center when the legs cross currencies.
    pub fx_premium: f64,
    /// Net positions below this are treated as zero.
    pub min_net_pos: f64,
    /// Minimum executable quantity per side.
    pub min_order: f64,
    /// Maximum quantity per side.
    pub max_order: f64,
    /// Redraw the dashboard between trades.
    pub print_on: bool,
}

/// Cross-venue running state owned by the strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetState {
    /// Sum of signed per-venue positions.
    pub net_position: f64,
    /// Cumulative P&L in base currency.
    pub pl: f64,
    /// Last traded arb value, for repeat suppression.
    pub last_arb: f64,
    /// Last traded amount, for repeat suppression.
    pub last_amount: f64,
}

/// One leg of a candidate trade.
#[derive(Debug, Clone)]
struct Leg {
    venue: Arc<VenueHandle>,
    market: Market,
}

/// The arbitrage strategy.
pub struct Strategy {
    venues: Vec<Arc<VenueHandle>>,
    params: StrategyParams,
    state: NetState,
}

impl Strategy {
    pub fn new(venues: Vec<Arc<VenueHandle>>, params: StrategyParams, initial_pl: f64) -> Self {
        let mut strategy = Self {
            venues,
            params,
            state: NetState {
                pl: initial_pl,
                ..NetState::default()
            },
        };
        strategy.calc_net_position();
        strategy
    }

    pub fn net_state(&self) -> NetState {
        self.state
    }

    /// Consume snapshots until the hub closes the channel, then hand back the
    /// final state for persistence.
    pub async fn run(mut self, mut snapshot_rx: mpsc::Receiver<Snapshot>) -> NetState {
        while let Some(snapshot) = snapshot_rx.recv().await {
            self.on_snapshot(&snapshot).await;
        }
        info!("strategy loop ended");
        self.state
    }

    /// Evaluate one snapshot: exit first, entry second.
    pub async fn on_snapshot(&mut self, snapshot: &Snapshot) {
        if self.state.net_position >= self.params.min_net_pos {
            if let Some(leg) = self.find_best_bid(snapshot) {
                let amount = self.state.net_position.min(leg.market.amount);
                info!(venue = %leg.venue, amount, "net long position exit");
                let fill = fill_or_kill(&leg.venue, Side::Sell, amount, leg.market.order_price).await;
                self.update_pl(leg.market.adj_price, fill, Side::Sell);
                self.after_trade();
            }
        } else if self.state.net_position <= -self.params.min_net_pos {
            if let Some(leg) = self.find_best_ask(snapshot) {
                let amount = (-self.state.net_position).min(leg.market.amount);
                info!(venue = %leg.venue, amount, "net short position exit");
                let fill = fill_or_kill(&leg.venue, Side::Buy, amount, leg.market.order_price).await;
                self.update_pl(leg.market.adj_price, fill, Side::Buy);
                self.after_trade();
            }
        } else if let Some((bid, ask)) = self.find_best_arb(snapshot) {
            let arb = bid.market.adj_price - ask.market.adj_price;
            let amount = bid.market.amount.min(ask.market.amount);
            if self.is_false_repeat(arb, amount) {
                debug!(arb, amount, "suppressing repeated opportunity");
                return;
            }
            info!(
                arb,
                amount,
                buy = %ask.venue,
                sell = %bid.venue,
                "arb opportunity"
            );
            self.send_pair(&bid, &ask, amount).await;
            self.after_trade();
            self.state.last_arb = arb;
            self.state.last_amount = amount;
        }
    }

    /// Highest bid among venues still able to sell, its amount capped by the
    /// venue's remaining short capacity.
    fn find_best_bid(&self, snapshot: &Snapshot) -> Option<Leg> {
        let mut best: Option<Leg> = None;
        for venue in &self.venues {
            let able_to_sell = venue.able_to_sell();
            if able_to_sell < self.params.min_order {
                continue;
            }
            let Some(bid) = snapshot
                .markets
                .get(venue.id())
                .and_then(|fb| fb.bid.as_ref())
            else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |leg| bid.adj_price > leg.market.adj_price)
            {
                let mut market = bid.clone();
                market.amount = market.amount.min(able_to_sell);
                best = Some(Leg {
                    venue: venue.clone(),
                    market,
                });
            }
        }
        best
    }

    /// Lowest ask among venues still able to buy, its amount capped by the
    /// venue's remaining long capacity.
    fn find_best_ask(&self, snapshot: &Snapshot) -> Option<Leg> {
        let mut best: Option<Leg> = None;
        for venue in &self.venues {
            let able_to_buy = venue.able_to_buy();
            if able_to_buy < self.params.min_order {
                continue;
            }
            let Some(ask) = snapshot
                .markets
                .get(venue.id())
                .and_then(|fb| fb.ask.as_ref())
            else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |leg| ask.adj_price < leg.market.adj_price)
            {
                let mut market = ask.clone();
                market.amount = market.amount.min(able_to_buy);
                best = Some(Leg {
                    venue: venue.clone(),
                    market,
                });
            }
        }
        best
    }

    /// Scan ordered venue pairs and pick the one maximizing
    /// `bid.adj - ask.adj - needed_arb`, requiring it to be non-negative.
    fn find_best_arb(&self, snapshot: &Snapshot) -> Option<(Leg, Leg)> {
        let mut best: Option<(Leg, Leg)> = None;
        let mut best_opp = 0.0;

        for sell_venue in &self.venues {
            let able_to_sell = sell_venue.able_to_sell();
            if able_to_sell < self.params.min_order {
                continue;
            }
            let Some(bid) = snapshot
                .markets
                .get(sell_venue.id())
                .and_then(|fb| fb.bid.as_ref())
            else {
                continue;
            };

            for buy_venue in &self.venues {
                if buy_venue.id() == sell_venue.id() {
                    continue;
                }
                let able_to_buy = buy_venue.able_to_buy();
                if able_to_buy < self.params.min_order {
                    continue;
                }
                let Some(ask) = snapshot
                    .markets
                    .get(buy_venue.id())
                    .and_then(|fb| fb.ask.as_ref())
                else {
                    continue;
                };

                let opp = bid.adj_price - ask.adj_price - self.needed_arb(buy_venue, sell_venue);
                if opp >= best_opp {
                    let mut bid_market = bid.clone();
                    bid_market.amount = bid_market.amount.min(able_to_sell);
                    let mut ask_market = ask.clone();
                    ask_market.amount = ask_market.amount.min(able_to_buy);
                    best = Some((
                        Leg {
                            venue: sell_venue.clone(),
                            market: bid_market,
                        },
                        Leg {
                            venue: buy_venue.clone(),
                            market: ask_market,
                        },
                    ));
                    best_opp = opp;
                }
            }
        }

        best
    }

    /// The entry threshold: widens toward `max_arb` as positions discourage
    /// the trade, narrows toward `min_arb` as they encourage unwinding, with
    /// an FX premium when the legs cross currencies.
    fn needed_arb(&self, buy: &VenueHandle, sell: &VenueHandle) -> f64 {
        let mut center = (self.params.max_arb + self.params.min_arb) / 2.0;
        let half_dist = (self.params.max_arb - center) / 2.0;
        if buy.spec().currency_code() != sell.spec().currency_code() {
            center += self.params.fx_premium;
        }
        let buy_pct = buy.position() / buy.spec().max_position;
        let sell_pct = sell.position() / sell.spec().max_position;
        center + buy_pct * half_dist - sell_pct * half_dist
    }

    /// A candidate identical to the last fired trade is a stale quote unless
    /// the amount is pinned at `max_order` (then the market is deep enough
    /// that the engine is rate-limited by `max_order`, not by staleness).
    fn is_false_repeat(&self, arb: f64, amount: f64) -> bool {
        (arb - self.state.last_arb).abs() < REPEAT_TOL
            && (amount - self.state.last_amount).abs() < REPEAT_TOL
            && (amount - self.params.max_order).abs() >= REPEAT_TOL
    }

    /// Fire the paired legs with priority sequencing.
    async fn send_pair(&mut self, bid: &Leg, ask: &Leg, amount: f64) {
        let bid_priority = bid.venue.spec().priority;
        let ask_priority = ask.venue.spec().priority;

        if bid_priority == ask_priority {
            let (buy_fill, sell_fill) = tokio::join!(
                fill_or_kill(&ask.venue, Side::Buy, amount, ask.market.order_price),
                fill_or_kill(&bid.venue, Side::Sell, amount, bid.market.order_price),
            );
            self.update_pl(ask.market.adj_price, buy_fill, Side::Buy);
            self.update_pl(bid.market.adj_price, sell_fill, Side::Sell);
        } else if bid_priority < ask_priority {
            let fill = fill_or_kill(&bid.venue, Side::Sell, amount, bid.market.order_price).await;
            self.update_pl(bid.market.adj_price, fill, Side::Sell);
            if fill >= self.params.min_net_pos {
                let buy_fill =
                    fill_or_kill(&ask.venue, Side::Buy, fill, ask.market.order_price).await;
                self.update_pl(ask.market.adj_price, buy_fill, Side::Buy);
            }
        } else {
            let fill = fill_or_kill(&ask.venue, Side::Buy, amount, ask.market.order_price).await;
            self.update_pl(ask.market.adj_price, fill, Side::Buy);
            if fill >= self.params.min_net_pos {
                let sell_fill =
                    fill_or_kill(&bid.venue, Side::Sell, fill, bid.market.order_price).await;
                self.update_pl(bid.market.adj_price, sell_fill, Side::Sell);
            }
        }
    }

    /// P&L advances on `adj_price` so it reflects the post-fee,
    /// FX-normalized economics of each observed fill.
    fn update_pl(&mut self, price: f64, amount: f64, side: Side) {
        let signed = match side {
            Side::Buy => -amount,
            Side::Sell => amount,
        };
        self.state.pl += price * signed;
    }

    fn calc_net_position(&mut self) {
        self.state.net_position = self.venues.iter().map(|v| v.position()).sum();
        for venue in &self.venues {
            debug!(venue = %venue, position = venue.position(), "position");
        }
    }

    fn after_trade(&mut self) {
        self.calc_net_position();
        if self.params.print_on {
            display::print_results(&self.venues, self.state.pl);
        }
    }
}
