//! Payment channels and the four-bucket channel partition.
//!
//! The partition is rebuilt from scratch on every load and never touched
//! by sorts, so its buckets always keep load order.

use crate::{
    error::{StoreError, StoreResult},
    record::Record,
    result_set::ResultSet,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of payment channels that get a partition bucket.
/// Discriminants are the 1-based menu choices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentChannel {
    #[serde(rename = "card")]
    Card = 1,
    #[serde(rename = "ACH")]
    Ach = 2,
    #[serde(rename = "UPI")]
    Upi = 3,
    #[serde(rename = "wire_transfer")]
    WireTransfer = 4,
}

impl PaymentChannel {
    pub const ALL: [PaymentChannel; 4] = [
        PaymentChannel::Card,
        PaymentChannel::Ach,
        PaymentChannel::Upi,
        PaymentChannel::WireTransfer,
    ];

    /// Exact, case-sensitive name as it appears in the data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card         => "card",
            Self::Ach          => "ACH",
            Self::Upi          => "UPI",
            Self::WireTransfer => "wire_transfer",
        }
    }

    /// Map a raw column value onto a channel. Anything outside the four
    /// known names (including case variants) is `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }

    /// Resolve a 1-based bucket choice.
    pub fn from_choice(choice: usize) -> StoreResult<Self> {
        match choice {
            1 => Ok(Self::Card),
            2 => Ok(Self::Ach),
            3 => Ok(Self::Upi),
            4 => Ok(Self::WireTransfer),
            _ => Err(StoreError::InvalidChannelChoice { choice }),
        }
    }

    pub fn choice(&self) -> usize {
        *self as usize
    }

    fn bucket(&self) -> usize {
        self.choice() - 1
    }
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentChannel {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::classify(s).ok_or_else(|| StoreError::UnknownChannel { name: s.to_string() })
    }
}

/// Per-channel record tallies, in `PaymentChannel::ALL` order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub card:          usize,
    pub ach:           usize,
    pub upi:           usize,
    pub wire_transfer: usize,
}

impl ChannelCounts {
    pub fn total(&self) -> usize {
        self.card + self.ach + self.upi + self.wire_transfer
    }

    pub fn as_array(&self) -> [usize; 4] {
        [self.card, self.ach, self.upi, self.wire_transfer]
    }
}

/// Four buckets of record copies, one per known channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelPartition {
    buckets: [ResultSet; 4],
}

impl ChannelPartition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every bucket's contents.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// File a copy of `record` under its channel. Returns the channel, or
    /// `None` when the record's channel is not one of the four.
    pub fn insert(&mut self, record: &Record) -> Option<PaymentChannel> {
        let channel = PaymentChannel::classify(&record.payment_channel)?;
        self.buckets[channel.bucket()].push(record.clone());
        Some(channel)
    }

    pub fn bucket(&self, channel: PaymentChannel) -> &ResultSet {
        &self.buckets[channel.bucket()]
    }

    /// Copy out the bucket for a 1-based choice.
    pub fn by_choice(&self, choice: usize) -> StoreResult<ResultSet> {
        let channel = PaymentChannel::from_choice(choice)?;
        Ok(self.bucket(channel).clone())
    }

    pub fn counts(&self) -> ChannelCounts {
        ChannelCounts {
            card:          self.bucket(PaymentChannel::Card).len(),
            ach:           self.bucket(PaymentChannel::Ach).len(),
            upi:           self.bucket(PaymentChannel::Upi).len(),
            wire_transfer: self.bucket(PaymentChannel::WireTransfer).len(),
        }
    }

    pub fn heap_bytes(&self) -> usize {
        self.buckets.iter().map(ResultSet::heap_bytes).sum()
    }
}
