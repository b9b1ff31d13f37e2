//! Order status and its rank
//!
//! Rank order is the one invariant every write path protects: once a record has
//! held a status, no merge may move it to a lower rank.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Order status
///
/// Serialized as the lower-case English name. Parsing is case-insensitive and
/// also accepts the legacy intake names (`pranim`, `pastrim`, `gati`,
/// `dorezuar`) still present in older device data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum OrderStatus {
    /// 已接收
    #[default]
    Received,
    /// 清洗中
    Cleaning,
    /// 可取件
    Ready,
    /// 已交付
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Received,
        OrderStatus::Cleaning,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ];

    /// Integer rank, strictly increasing along the lifecycle (1..=4)
    pub const fn rank(self) -> u8 {
        match self {
            OrderStatus::Received => 1,
            OrderStatus::Cleaning => 2,
            OrderStatus::Ready => 3,
            OrderStatus::Delivered => 4,
        }
    }

    /// Received, cleaning and ready orders count against the client limit.
    pub const fn is_active(self) -> bool {
        !matches!(self, OrderStatus::Delivered)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Cleaning => "cleaning",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// The higher-ranked of two statuses
    pub fn max_rank(self, other: OrderStatus) -> OrderStatus {
        if other.rank() > self.rank() { other } else { self }
    }
}

/// Status string did not name any known status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "received" | "pranim" => Ok(OrderStatus::Received),
            "cleaning" | "pastrim" => Ok(OrderStatus::Cleaning),
            "ready" | "gati" => Ok(OrderStatus::Ready),
            "delivered" | "dorezuar" => Ok(OrderStatus::Delivered),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
