//! Deterministic synthetic transaction rows.
//!
//! RULE: nothing here touches a platform RNG. Every row flows from one
//! seeded PCG stream, so the same seed always yields the same file and
//! benchmark runs are comparable across machines.

use crate::{error::StoreResult, parser, record::Record};
use chrono::DateTime;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::io::Write;
use std::path::Path;

/// 2023-01-01T00:00:00Z
const BASE_EPOCH_SECS: i64 = 1_672_531_200;
const YEAR_SECS: u64 = 365 * 24 * 60 * 60;

const CHANNELS: &[&str] = &["card", "ACH", "UPI", "wire_transfer"];
/// Channels outside the partitioned four, seen occasionally in real data.
const STRAY_CHANNELS: &[&str] = &["crypto", "cash", "Card"];
const TYPES: &[&str] = &["deposit", "transfer", "withdrawal", "payment"];
const LOCATIONS: &[&str] = &[
    "Berlin", "Dubai", "London", "Mumbai", "New York", "Paris", "Singapore",
    "Sydney", "Tokyo", "Toronto",
];
const MERCHANTS: &[&str] = &[
    "entertainment", "grocery", "online", "restaurant", "retail", "travel",
    "utilities", "other",
];
const DEVICES: &[&str] = &["mobile", "web", "atm", "pos"];
const FRAUD_TYPES: &[&str] = &["card_not_present", "account_takeover", "money_laundering", "phishing"];

/// A seeded random stream for sample generation.
pub struct SampleRng {
    inner: Pcg64Mcg,
}

impl SampleRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). `n` of zero yields zero.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Simplified Pareto draw; most values sit near `x_min`.
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    pub fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.next_u64_below(options.len() as u64) as usize]
    }
}

/// Produces an endless, reproducible sequence of transaction rows.
pub struct SampleGenerator {
    rng:     SampleRng,
    next_id: u64,
    /// Probability that a row carries a channel outside the known four.
    pub stray_channel_rate: f64,
    /// Probability that a numeric column is written as unreadable text.
    pub garbled_rate:       f64,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SampleRng::new(seed),
            next_id: 1,
            stray_channel_rate: 0.02,
            garbled_rate: 0.0,
        }
    }

    pub fn with_garbled_rate(mut self, rate: f64) -> Self {
        self.garbled_rate = rate;
        self
    }

    pub fn record(&mut self) -> Record {
        let id = self.next_id;
        self.next_id += 1;
        let rng = &mut self.rng;

        let offset = rng.next_u64_below(YEAR_SECS) as i64;
        let timestamp = DateTime::from_timestamp(BASE_EPOCH_SECS + offset, 0)
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default();
        let is_fraud = rng.chance(0.04);
        let payment_channel = if rng.chance(self.stray_channel_rate) {
            rng.pick(STRAY_CHANNELS)
        } else {
            rng.pick(CHANNELS)
        };
        // Amounts kept to cents.
        let amount = (rng.pareto(10.0, 1.3).min(50_000.0) * 100.0).round() / 100.0;

        Record {
            transaction_id:              format!("T{id:06}"),
            timestamp,
            sender_account:              format!("ACC{:06}", rng.next_u64_below(1_000_000)),
            receiver_account:            format!("ACC{:06}", rng.next_u64_below(1_000_000)),
            amount,
            transaction_type:            rng.pick(TYPES).to_string(),
            merchant_category:           rng.pick(MERCHANTS).to_string(),
            location:                    rng.pick(LOCATIONS).to_string(),
            device_used:                 rng.pick(DEVICES).to_string(),
            is_fraud,
            fraud_type:                  if is_fraud { rng.pick(FRAUD_TYPES).to_string() } else { String::new() },
            time_since_last_transaction: format!("{:.2}", rng.next_f64() * 48.0),
            spending_deviation_score:    format!("{:.2}", rng.next_f64() * 6.0 - 3.0),
            velocity_score:              rng.next_u64_below(20) as f64,
            geo_anomaly_score:           (rng.next_f64() * 100.0).round() / 100.0,
            payment_channel:             payment_channel.to_string(),
            ip_address:                  format!(
                "{}.{}.{}.{}",
                rng.next_u64_below(256),
                rng.next_u64_below(256),
                rng.next_u64_below(256),
                rng.next_u64_below(256)
            ),
            device_hash:                 format!("{:016x}", rng.inner.next_u64()),
        }
    }

    /// One CSV data line. With `garbled_rate` set, the amount column is
    /// occasionally replaced by text the parser must default.
    pub fn line(&mut self) -> String {
        let record = self.record();
        let line = parser::to_line(&record);
        if self.garbled_rate > 0.0 && self.rng.chance(self.garbled_rate) {
            let mut cols: Vec<&str> = line.split(',').collect();
            cols[4] = "n/a";
            return cols.join(",");
        }
        line
    }

    pub fn lines(&mut self, n: usize) -> Vec<String> {
        (0..n).map(|_| self.line()).collect()
    }

    /// Write a header plus `rows` data lines to `path`.
    pub fn write_csv(&mut self, path: &Path, rows: usize) -> StoreResult<()> {
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(out, "{}", parser::HEADER)?;
        for _ in 0..rows {
            writeln!(out, "{}", self.line())?;
        }
        out.flush()?;
        log::info!("Wrote {rows} sample rows to {}", path.display());
        Ok(())
    }
}
