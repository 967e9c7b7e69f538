//! One transaction row, and the string fields it can be searched by.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single transaction. Every field is owned, so `clone()` is a full
/// deep copy and no record ever refers to another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub transaction_id:              String,
    pub timestamp:                   String,
    pub sender_account:              String,
    pub receiver_account:            String,
    pub amount:                      f64,
    pub transaction_type:            String,
    pub merchant_category:           String,
    pub location:                    String,
    pub device_used:                 String,
    pub is_fraud:                    bool,
    pub fraud_type:                  String,
    pub time_since_last_transaction: String,
    pub spending_deviation_score:    String,
    pub velocity_score:              f64,
    pub geo_anomaly_score:           f64,
    pub payment_channel:             String,
    pub ip_address:                  String,
    pub device_hash:                 String,
}

impl Record {
    /// Borrow the value of a string field.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::TransactionId            => &self.transaction_id,
            Field::Timestamp                => &self.timestamp,
            Field::SenderAccount            => &self.sender_account,
            Field::ReceiverAccount          => &self.receiver_account,
            Field::TransactionType          => &self.transaction_type,
            Field::MerchantCategory         => &self.merchant_category,
            Field::Location                 => &self.location,
            Field::DeviceUsed               => &self.device_used,
            Field::FraudType                => &self.fraud_type,
            Field::TimeSinceLastTransaction => &self.time_since_last_transaction,
            Field::SpendingDeviationScore   => &self.spending_deviation_score,
            Field::PaymentChannel           => &self.payment_channel,
            Field::IpAddress                => &self.ip_address,
            Field::DeviceHash               => &self.device_hash,
        }
    }

    /// Bytes held on the heap by this record's strings.
    pub fn heap_bytes(&self) -> usize {
        Field::ALL.iter().map(|f| self.field(*f).len()).sum()
    }
}

/// The string-valued columns. Scans compare them by exact byte equality
/// and binary search orders them bytewise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TransactionId,
    Timestamp,
    SenderAccount,
    ReceiverAccount,
    TransactionType,
    MerchantCategory,
    Location,
    DeviceUsed,
    FraudType,
    TimeSinceLastTransaction,
    SpendingDeviationScore,
    PaymentChannel,
    IpAddress,
    DeviceHash,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::TransactionId,
        Field::Timestamp,
        Field::SenderAccount,
        Field::ReceiverAccount,
        Field::TransactionType,
        Field::MerchantCategory,
        Field::Location,
        Field::DeviceUsed,
        Field::FraudType,
        Field::TimeSinceLastTransaction,
        Field::SpendingDeviationScore,
        Field::PaymentChannel,
        Field::IpAddress,
        Field::DeviceHash,
    ];

    /// Column name as it appears in the CSV header.
    pub fn column(&self) -> &'static str {
        match self {
            Self::TransactionId            => "transaction_id",
            Self::Timestamp                => "timestamp",
            Self::SenderAccount            => "sender_account",
            Self::ReceiverAccount          => "receiver_account",
            Self::TransactionType          => "transaction_type",
            Self::MerchantCategory         => "merchant_category",
            Self::Location                 => "location",
            Self::DeviceUsed               => "device_used",
            Self::FraudType                => "fraud_type",
            Self::TimeSinceLastTransaction => "time_since_last_transaction",
            Self::SpendingDeviationScore   => "spending_deviation_score",
            Self::PaymentChannel           => "payment_channel",
            Self::IpAddress                => "ip_address",
            Self::DeviceHash               => "device_hash",
        }
    }

    /// Short prefix used when labelling a search result, e.g. `Location=NY`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PaymentChannel  => "Channel",
            Self::TransactionType => "Type",
            Self::Location        => "Location",
            other                 => other.column(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        let wanted = s.trim();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.column() == wanted)
            .or(match wanted {
                "channel"  => Some(Field::PaymentChannel),
                "type"     => Some(Field::TransactionType),
                "id"       => Some(Field::TransactionId),
                _          => None,
            })
            .ok_or_else(|| StoreError::UnknownField { name: s.to_string() })
    }
}
