//! PaySim Transaction Producer
//!
//! Generates and publishes PaySim-style transactions to NATS for exercising
//! the scoring service.
//!
//! Usage: paysim-producer [nats_url] [subject] [count] [fraud_rate] [delay_ms]

use fraud_sentinel::types::{TransactionRecord, TxType};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Generator for synthetic PaySim traffic
struct PaySimGenerator {
    rng: rand::rngs::ThreadRng,
}

impl PaySimGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate an ordinary daytime transaction
    fn generate_legitimate(&mut self) -> TransactionRecord {
        let day = self.rng.gen_range(0..30u32);
        let hour = self.rng.gen_range(8..22u32);
        let step = day * 24 + hour;
        let origin = self.account_id();

        let (tx_type, dest, amount, dest_balance) = if self.rng.gen_bool(0.3) {
            (
                TxType::Payment,
                self.merchant_id(),
                self.rng.gen_range(10.0..500.0),
                0.0,
            )
        } else if self.rng.gen_bool(0.5) {
            (
                TxType::CashOut,
                self.account_id(),
                self.rng.gen_range(100.0..20_000.0),
                self.rng.gen_range(1_000.0..100_000.0),
            )
        } else {
            (
                TxType::Transfer,
                self.account_id(),
                self.rng.gen_range(100.0..20_000.0),
                self.rng.gen_range(1_000.0..100_000.0),
            )
        };

        let origin_balance = amount + self.rng.gen_range(1_000.0..50_000.0);
        TransactionRecord::new(step, tx_type, amount, &origin, &dest)
            .with_balances(origin_balance, dest_balance)
    }

    /// Generate a fraud-patterned transaction: a night-time transfer that
    /// drains the full origin balance into an empty destination account.
    fn generate_fraudulent(&mut self) -> TransactionRecord {
        let day = self.rng.gen_range(0..30u32);
        let hour = self.rng.gen_range(0..7u32); // night hours
        let step = (day * 24 + hour).max(1);
        let balance = self.rng.gen_range(50_000.0..1_000_000.0);
        let origin = self.account_id();
        let dest = self.account_id();

        TransactionRecord::new(step, TxType::Transfer, balance, &origin, &dest)
            .with_balances(balance, 0.0)
    }

    fn account_id(&mut self) -> String {
        format!("C{}", self.rng.gen_range(100_000_000..2_000_000_000u32))
    }

    fn merchant_id(&mut self) -> String {
        format!("M{}", self.rng.gen_range(100_000_000..2_000_000_000u32))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paysim_producer=info".parse()?),
        )
        .init();

    info!("Starting PaySim Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("transactions.paysim");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish transactions
    let mut generator = PaySimGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transactions...", count);

    let mut legitimate_count = 0;
    let mut fraud_count = 0;

    for i in 0..count {
        let record = if rng.gen_bool(fraud_rate) {
            fraud_count += 1;
            generator.generate_fraudulent()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&record)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} legitimate, {} fraud-patterned)",
                i + 1,
                count,
                legitimate_count,
                fraud_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} transactions ({} legitimate, {} fraud-patterned)",
        count, legitimate_count, fraud_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = PaySimGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let record = if rng.gen_bool(fraud_rate) {
            generator.generate_fraudulent()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&record)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
