//! txstore-runner: drives the indexed and linked transaction stores.
//!
//! Usage:
//!   txstore-runner --data transactions.csv --max 10000
//!   txstore-runner --generate sample.csv --rows 5000 --seed 7
//!   txstore-runner --data transactions.csv --ipc-mode

use anyhow::Result;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use txstore_core::{
    bench::{self, BenchKeys, BenchReport},
    export::export_results,
    instrument::{measure, OpMetrics},
    sample::SampleGenerator,
    Field, IndexedStore, LinkedStore, ResultSet, SortOrder, StoreConfig, StoreKind, TableStore,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Select {
        store: StoreKind,
    },
    Search {
        #[serde(default)]
        method: SearchMethod,
        field: String,
        value: String,
    },
    ByChannel {
        choice: usize,
    },
    Sort {
        #[serde(default)]
        algorithm: SortAlgorithm,
        #[serde(default)]
        order: SortOrder,
    },
    Page {
        index: usize,
    },
    Head {
        n: usize,
    },
    RestoreOrder,
    Export {
        path: String,
    },
    Reload {
        channel: Option<String>,
    },
    Quit,
}

#[derive(serde::Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum SearchMethod {
    #[default]
    Linear,
    Binary,
}

#[derive(serde::Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum SortAlgorithm {
    #[default]
    Quick,
    Merge,
}

/// The most recent query result and the label it is exported under.
struct LabeledResult {
    label:   String,
    results: ResultSet,
}

struct Session {
    indexed:   IndexedStore,
    linked:    LinkedStore,
    active:    StoreKind,
    lines:     Vec<String>,
    page_size: usize,
    last:      Option<LabeledResult>,
}

#[derive(serde::Serialize)]
struct UiState {
    active:         StoreKind,
    indexed_size:   usize,
    linked_size:    usize,
    channel_counts: [usize; 4],
    last_label:     Option<String>,
    last_len:       usize,
    page_size:      usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag_value(&args, "--config") {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(path) = flag_value(&args, "--data") {
        config.data_path = path.to_string();
    }
    config.max_records = parse_arg(&args, "--max", config.max_records);
    config.page_size = parse_arg(&args, "--page-size", config.page_size).max(1);
    let seed = parse_arg(&args, "--seed", 42u64);
    let rows = parse_arg(&args, "--rows", config.max_records);
    let channel = flag_value(&args, "--channel");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    if let Some(out) = flag_value(&args, "--generate") {
        SampleGenerator::new(seed).write_csv(Path::new(out), rows)?;
        println!("Wrote {rows} rows to {out}");
        return Ok(());
    }

    let lines = read_source(&config, rows, seed)?;

    if ipc_mode {
        let mut session = Session::start(&config, lines, channel)?;
        run_ipc_loop(&mut session)?;
    } else {
        println!("txstore-runner");
        println!("  data:      {}", config.data_path);
        println!("  max:       {}", config.max_records);
        println!("  channel:   {}", channel.unwrap_or("(all)"));
        println!();
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (a, b) = bench::compare(&borrowed, config.max_records, channel, &BenchKeys::default())?;
        print_summary(&a, &b);
    }

    Ok(())
}

/// Lines of the configured CSV, or a seeded synthetic table when the
/// file is absent.
fn read_source(config: &StoreConfig, rows: usize, seed: u64) -> Result<Vec<String>> {
    let path = Path::new(&config.data_path);
    if path.exists() {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        return Ok(text.lines().map(String::from).collect());
    }
    log::warn!(
        "{} not found; using {rows} synthetic rows (seed {seed})",
        path.display()
    );
    Ok(SampleGenerator::new(seed).lines(rows))
}

impl Session {
    fn start(config: &StoreConfig, lines: Vec<String>, channel: Option<&str>) -> Result<Self> {
        let mut session = Self {
            indexed: IndexedStore::new(config),
            linked: LinkedStore::new(config),
            active: StoreKind::Indexed,
            lines,
            page_size: config.page_size,
            last: None,
        };
        session.reload(channel)?;
        Ok(session)
    }

    fn store(&self) -> &dyn TableStore {
        match self.active {
            StoreKind::Indexed => &self.indexed,
            StoreKind::Linked => &self.linked,
        }
    }

    fn store_mut(&mut self) -> &mut dyn TableStore {
        match self.active {
            StoreKind::Indexed => &mut self.indexed,
            StoreKind::Linked => &mut self.linked,
        }
    }

    /// Load both stores from the session's source lines.
    fn reload(&mut self, channel: Option<&str>) -> Result<Vec<OpMetrics>> {
        let mut reports = Vec::with_capacity(2);
        let stores: [&mut dyn TableStore; 2] = [&mut self.indexed, &mut self.linked];
        for store in stores {
            let lines = &self.lines;
            let (summary, m) = measure(store, "load", |s| {
                s.load(&mut lines.iter().map(String::as_str), channel)
            });
            let summary = summary?;
            if summary.truncated {
                log::warn!("[{}] stopped at {} records", m.store, summary.retained);
            }
            reports.push(m.with_result_len(summary.retained));
        }
        self.last = None;
        Ok(reports)
    }

    fn remember(&mut self, label: String, results: ResultSet) -> usize {
        let len = results.len();
        self.last = Some(LabeledResult { label, results });
        len
    }

    fn state(&self) -> UiState {
        UiState {
            active:         self.active,
            indexed_size:   self.indexed.size(),
            linked_size:    self.linked.size(),
            channel_counts: self.store().channel_counts().as_array(),
            last_label:     self.last.as_ref().map(|l| l.label.clone()),
            last_len:       self.last.as_ref().map_or(0, |l| l.results.len()),
            page_size:      self.page_size,
        }
    }

    fn handle(&mut self, cmd: IpcCommand) -> Result<serde_json::Value> {
        use serde_json::json;

        let reply = match cmd {
            IpcCommand::GetState | IpcCommand::Quit => serde_json::to_value(self.state())?,
            IpcCommand::Select { store } => {
                self.active = store;
                serde_json::to_value(self.state())?
            }
            IpcCommand::Search { method, field, value } => {
                let field: Field = field.parse()?;
                let label = format!("{}={value}", field.label());
                let (results, m) = match method {
                    SearchMethod::Linear => {
                        measure(self.store_mut(), "linear search", |s| s.scan_by(field, &value))
                    }
                    SearchMethod::Binary => measure(self.store_mut(), "binary search", |s| {
                        s.binary_search_by(field, &value)
                    }),
                };
                let len = self.remember(label.clone(), results);
                json!({ "label": label, "count": len, "metrics": m.with_result_len(len) })
            }
            IpcCommand::ByChannel { choice } => {
                let (results, m) =
                    measure(self.store_mut(), "bucket lookup", |s| s.by_channel(choice));
                let results = results?;
                let label = format!("Channel={}", txstore_core::PaymentChannel::from_choice(choice)?);
                let len = self.remember(label.clone(), results);
                json!({ "label": label, "count": len, "metrics": m.with_result_len(len) })
            }
            IpcCommand::Sort { algorithm, order } => {
                let ((), m) = match algorithm {
                    SortAlgorithm::Quick => measure(self.store_mut(), "quicksort", |s| {
                        s.sort_by_location(order)
                    }),
                    SortAlgorithm::Merge => measure(self.store_mut(), "mergesort", |s| {
                        s.sort_by_location_merge(order)
                    }),
                };
                report_to_operator(&m);
                json!({ "sorted": order.label(), "metrics": m })
            }
            IpcCommand::Page { index } => match &self.last {
                Some(last) => match last.results.page(index, self.page_size) {
                    Some(page) => json!({ "label": last.label, "page": page }),
                    None => json!({ "label": last.label, "page": null }),
                },
                None => json!({ "error": "no results to page" }),
            },
            IpcCommand::Head { n } => {
                let rows = self.store().head(n);
                json!({ "store": self.active, "rows": rows.as_slice() })
            }
            IpcCommand::RestoreOrder => {
                self.store_mut().restore_load_order();
                serde_json::to_value(self.state())?
            }
            IpcCommand::Export { path } => match &self.last {
                Some(last) => {
                    let header = export_results(Path::new(&path), &last.label, &last.results)?;
                    json!({ "exported": header })
                }
                None => json!({ "error": "no results to export" }),
            },
            IpcCommand::Reload { channel } => {
                let reports = self.reload(channel.as_deref())?;
                json!({ "reloaded": reports, "state": self.state() })
            }
        };
        Ok(reply)
    }
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };
        let quit = matches!(cmd, IpcCommand::Quit);

        let reply = match session.handle(cmd) {
            Ok(v) => v,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
        if quit {
            break;
        }
    }
    Ok(())
}

/// Operator-facing timing report, kept off stdout so IPC replies stay
/// one JSON document per line.
fn report_to_operator(m: &OpMetrics) {
    eprintln!("{}", m.report());
}

fn print_summary(a: &BenchReport, b: &BenchReport) {
    println!("=== LOAD ===");
    for r in [a, b] {
        println!(
            "  {:<12} retained {:>6} | scanned {:>6} | defaulted {:>4}{}",
            r.store.label(),
            r.loaded.retained,
            r.loaded.scanned,
            r.loaded.defaulted,
            if r.loaded.truncated { " | truncated" } else { "" }
        );
    }
    let c = a.loaded.per_channel;
    println!(
        "  channels: card {} | ACH {} | UPI {} | wire_transfer {}",
        c.card, c.ach, c.upi, c.wire_transfer
    );

    println!();
    println!("=== OPERATIONS (microseconds / footprint bytes) ===");
    println!(
        "  {:<32} {:>8} {:>12} {:>8} {:>12} {:>7}",
        "operation", "Array", "", "Linked", "", "rows"
    );
    for (x, y) in a.ops.iter().zip(&b.ops) {
        let rows = x.result_len.map(|n| n.to_string()).unwrap_or_default();
        println!(
            "  {:<32} {:>8} {:>12} {:>8} {:>12} {:>7}",
            x.operation, x.elapsed_micros, x.footprint_bytes, y.elapsed_micros, y.footprint_bytes, rows
        );
    }

    println!();
    if a.agrees_with(b) {
        println!("  both stores returned identical result sizes");
    } else {
        println!("  WARNING: stores disagree on result sizes");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
