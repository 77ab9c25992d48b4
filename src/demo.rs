//! Demo catalog: payment reconciliation data set.
//!
//! Our processing operations are matched against two partner registries.
//! Amounts are drawn from a seeded generator so the catalog is identical on
//! every build. Two planted rows (`PA023`, `PA037`) disagree with partner A's
//! registry and are the discrepancies a reconciliation query should find.

use std::ops::Range;

use rand::prelude::*;
use tracing::info;

use crate::{
    error::Result,
    sql::{catalog::Catalog, schema::Table, types::Value},
};

/// Seed used by [`catalog`]
pub const DEMO_SEED: u64 = 42;

const DATE: &str = "2025-01-15";

/// (partner_contract_id, commission_percent, fixed_commission)
const COMMISSION_RATES: [(&str, f64, f64); 2] = [("PARTNER_A", 0.02, 0.50), ("PARTNER_B", 0.015, 1.00)];

type Record = Vec<(&'static str, Value)>;

/// Builds the demo catalog
pub fn catalog() -> Result<Catalog> {
    catalog_with_seed(DEMO_SEED)
}

/// Builds the demo catalog with a different amount seed
pub fn catalog_with_seed(seed: u64) -> Result<Catalog> {
    let mut rng = StdRng::seed_from_u64(seed);
    let operations = processing_operations(&mut rng);
    let records = operations.iter().map(Operation::record).collect();
    let tables = vec![
        describe_operations(Table::from_records("processing_operations", records)?),
        describe_additional_data(Table::from_records("operation_additional_data", additional_data())?),
        describe_partner_a(Table::from_records("partner_a_payments", partner_a_payments(&operations))?),
        describe_partner_b(Table::from_records("partner_b_payments", partner_b_payments(&operations))?),
        describe_registries(Table::from_records("registry_statuses", registry_statuses())?),
        describe_rates(Table::from_records("commission_rates", commission_rates())?),
    ];
    let catalog = Catalog::from_tables(tables)?;
    info!(seed, tables = catalog.len(), "demo catalog generated");
    Ok(catalog)
}

struct Operation {
    id: String,
    finalized_date: &'static str,
    amount: f64,
    status: &'static str,
    commission: Option<f64>,
    partner: &'static str,
}

impl Operation {
    fn record(&self) -> Record {
        vec![
            ("processing_id", Value::from(self.id.as_str())),
            ("created_date", Value::from(DATE)),
            ("finalized_date", Value::from(self.finalized_date)),
            ("amount", Value::Float(self.amount)),
            ("currency", Value::from("EUR")),
            ("status", Value::from(self.status)),
            ("commission_amount", Value::from(self.commission)),
            ("partner_contract_id", Value::from(self.partner)),
        ]
    }
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Commission owed on an amount under a partner's rate
fn commission(partner: &str, amount: f64) -> Option<f64> {
    COMMISSION_RATES
        .iter()
        .find(|(id, ..)| *id == partner)
        .map(|(_, percent, fixed)| round2(amount * percent + fixed))
}

fn processing_operations(rng: &mut StdRng) -> Vec<Operation> {
    let mut operations = Vec::new();
    let mut generate = |prefix: &str,
                        ids: Range<u32>,
                        status: &'static str,
                        finalized_date: &'static str,
                        partner: &'static str,
                        range: Range<f64>| {
        for i in ids {
            operations.push(Operation {
                id: format!("{}{:03}", prefix, i),
                finalized_date,
                amount: round2(rng.gen_range(range.clone())),
                status,
                commission: None,
                partner,
            });
        }
    };
    generate("PA", 1..41, "success", DATE, "PARTNER_A", 50.0..500.0);
    generate("PA", 41..51, "failed", DATE, "PARTNER_A", 50.0..500.0);
    generate("PA", 51..61, "pending", "2025-01-16", "PARTNER_A", 50.0..500.0);
    generate("PB", 1..31, "success", DATE, "PARTNER_B", 100.0..800.0);
    generate("PB", 31..41, "failed", DATE, "PARTNER_B", 100.0..800.0);

    // planted discrepancies, carrying their own commission
    for (id, amount, commission) in [("PA023", 245.50, 5.41), ("PA037", 189.75, 4.30)] {
        operations.push(Operation {
            id: id.to_string(),
            finalized_date: DATE,
            amount,
            status: "success",
            commission: Some(commission),
            partner: "PARTNER_A",
        });
    }

    for op in operations.iter_mut() {
        if op.status == "success" && op.commission.is_none() {
            op.commission = commission(op.partner, op.amount);
        }
    }
    operations
}

/// First operation with the given id
fn operation<'a>(operations: &'a [Operation], id: &str) -> Option<&'a Operation> {
    operations.iter().find(|op| op.id == id)
}

fn additional_data() -> Vec<Record> {
    let link = |id: String, partner_id: String| {
        vec![
            ("processing_id", Value::from(id)),
            ("created_date", Value::from(DATE)),
            ("additional_type", Value::from("partner_operation_id")),
            ("additional_value", Value::from(partner_id)),
        ]
    };
    (1..61)
        .map(|i| link(format!("PA{:03}", i), format!("PTR_A_{:03}", i)))
        .chain((1..41).map(|i| link(format!("PB{:03}", i), format!("PTR_B_{:03}", i))))
        .collect()
}

fn partner_a_payments(operations: &[Operation]) -> Vec<Record> {
    let payment = |i: u32, status: &str, commission: Option<f64>| {
        vec![
            ("partner_id", Value::from(format!("PTR_A_{:03}", i))),
            ("processing_id", Value::from(format!("PA{:03}", i))),
            ("status", Value::from(status)),
            ("commission", Value::from(commission)),
            ("registry_id", Value::from("REG001")),
        ]
    };

    let mut payments = Vec::new();
    for i in 1..41 {
        // completed payments report the commission we calculated
        let ours = operation(operations, &format!("PA{:03}", i)).and_then(|op| op.commission);
        payments.push(payment(i, "COMPLETED", ours));
    }
    payments.extend((41..51).map(|i| payment(i, "DECLINED", Some(0.0))));
    payments.extend((51..61).map(|i| payment(i, "IN_PROGRESS", Some(0.0))));

    payments.push(payment(23, "DECLINED", Some(0.0)));
    payments.push(payment(37, "COMPLETED", Some(3.20)));
    payments
}

fn partner_b_payments(operations: &[Operation]) -> Vec<Record> {
    let payment = |i: u32, status: &str, registry: &str| {
        let commission = match status {
            // partner B reports its own calculation on our amount
            "SUCCESS" => operation(operations, &format!("PB{:03}", i))
                .and_then(|op| commission("PARTNER_B", op.amount)),
            _ => Some(0.0),
        };
        vec![
            ("partner_id", Value::from(format!("PTR_B_{:03}", i))),
            ("status", Value::from(status)),
            ("commission", Value::from(commission)),
            ("registry_id", Value::from(registry)),
        ]
    };

    (1..26)
        .map(|i| payment(i, "SUCCESS", "REG_B_001"))
        .chain((26..31).map(|i| payment(i, "FAILED", "REG_B_001")))
        // registry REG_B_002 repeats part of REG_B_001
        .chain((16..26).map(|i| payment(i, "SUCCESS", "REG_B_002")))
        .chain((31..36).map(|i| payment(i, "FAILED", "REG_B_002")))
        .collect()
}

fn registry_statuses() -> Vec<Record> {
    [
        ("REG001", "PARTNER_A", 0),
        ("REG002", "PARTNER_A", 1),
        ("REG_B_001", "PARTNER_B", 0),
        ("REG_B_002", "PARTNER_B", 0),
    ]
    .into_iter()
    .map(|(id, partner, excluded)| {
        vec![
            ("registry_id", Value::from(id)),
            ("registry_date", Value::from(DATE)),
            ("partner_contract_id", Value::from(partner)),
            ("is_excluded", Value::Integer(excluded)),
        ]
    })
    .collect()
}

fn commission_rates() -> Vec<Record> {
    COMMISSION_RATES
        .iter()
        .map(|(partner, percent, fixed)| {
            vec![
                ("partner_contract_id", Value::from(*partner)),
                ("commission_percent", Value::Float(*percent)),
                ("fixed_commission", Value::Float(*fixed)),
                ("start_date", Value::from("2025-01-01")),
                ("end_date", Value::from("2025-12-31")),
            ]
        })
        .collect()
}

fn describe_operations(table: Table) -> Table {
    table
        .with_description("Operations of our payment processing")
        .describe_column("processing_id", "Operation id in our system")
        .describe_column("created_date", "Date the operation was created")
        .describe_column("finalized_date", "Date the final status became known")
        .describe_column("amount", "Operation amount")
        .describe_column("currency", "Operation currency, always EUR")
        .describe_column("status", "Current status: success, failed, pending")
        .describe_column("commission_amount", "Calculated commission, successful operations only")
        .describe_column("partner_contract_id", "Partner id, see commission_rates")
}

fn describe_additional_data(table: Table) -> Table {
    table
        .with_description("Additional operation data, one row per attribute")
        .describe_column("processing_id", "Operation id, see processing_operations")
        .describe_column("created_date", "Date the record was created")
        .describe_column("additional_type", "Attribute type, e.g. partner_operation_id")
        .describe_column("additional_value", "Attribute value")
}

fn describe_partner_a(table: Table) -> Table {
    table
        .with_description("Registry of operations reported by partner A")
        .describe_column("partner_id", "Operation id at partner A")
        .describe_column("processing_id", "Our operation id, may be NULL")
        .describe_column("status", "Partner status: COMPLETED, DECLINED, IN_PROGRESS")
        .describe_column("commission", "Commission reported by the partner")
        .describe_column("registry_id", "Registry the operation arrived in")
}

fn describe_partner_b(table: Table) -> Table {
    table
        .with_description("Registry of operations reported by partner B")
        .describe_column("partner_id", "Operation id at partner B, see operation_additional_data")
        .describe_column("status", "Partner status: SUCCESS, FAILED")
        .describe_column("commission", "Commission reported by the partner")
        .describe_column("registry_id", "Registry the operation arrived in")
}

fn describe_registries(table: Table) -> Table {
    table
        .with_description("Partner registries")
        .describe_column("registry_id", "Registry id")
        .describe_column("registry_date", "Registry date")
        .describe_column("partner_contract_id", "Partner the registry belongs to")
        .describe_column("is_excluded", "1 if the registry must be ignored, 0 otherwise")
}

fn describe_rates(table: Table) -> Table {
    table
        .with_description("Commission rates per partner")
        .describe_column("partner_contract_id", "Partner id")
        .describe_column("commission_percent", "Percentage rate, e.g. 0.02 for 2%")
        .describe_column("fixed_commission", "Fixed part of the commission")
        .describe_column("start_date", "First day the rate applies")
        .describe_column("end_date", "Last day the rate applies")
}
