//! OKCoin WebSocket wire types.

use basis_instrument::{Book, BookLevel, VenueId};
use serde::{Deserialize, Deserializer};

/// OKCoin wraps every push in a one-element array of channel messages.
#[derive(Debug, Deserialize)]
pub struct Envelope(pub Vec<ChannelMessage>);

#[derive(Debug, Deserialize)]
pub struct ChannelMessage {
    #[serde(default)]
    pub channel: String,
    /// Error code, string-encoded on the wire; zero or absent means success.
    #[serde(default, rename = "errorcode", deserialize_with = "de_opt_i64")]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Depth payload: `[price, amount]` pairs, top 20 levels.
#[derive(Debug, Deserialize)]
pub struct DepthData {
    #[serde(default)]
    pub bids: Vec<[f64; 2]>,
    #[serde(default)]
    pub asks: Vec<[f64; 2]>,
}

/// Accept both `"10010"` and `10010`.
fn de_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.parse::<i64>().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    })
}

/// Decode one depth push into a [`Book`]; failures become error books.
pub fn decode_book(venue: &VenueId, text: &str) -> Book {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(error) => return Book::err(venue.clone(), format!("depth decode: {error}")),
    };
    let Some(message) = envelope.0.first() else {
        return Book::err(venue.clone(), "empty envelope");
    };
    if let Some(code) = message.error_code.filter(|&code| code != 0) {
        return Book::err(venue.clone(), format!("venue error code {code}"));
    }
    let Some(data) = &message.data else {
        return Book::err(venue.clone(), "depth message without data");
    };
    let depth: DepthData = match serde_json::from_value(data.clone()) {
        Ok(depth) => depth,
        Err(error) => return Book::err(venue.clone(), format!("depth decode: {error}")),
    };

    let to_levels = |raw: &[[f64; 2]]| {
        raw.iter()
            .map(|&[price, amount]| BookLevel::new(price, amount))
            .collect::<Vec<_>>()
    };
    Book::new(venue.clone(), to_levels(&depth.bids), to_levels(&depth.asks))
}
