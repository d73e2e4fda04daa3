//! Carry-trade table command handler.

use crate::analytics::carry::carry_snapshot;
use crate::analytics::format_date_ar;
use crate::config::ServiceConfig;
use crate::markets::MarketsClient;

/// Print the carry table followed by the early-exit simulation.
pub async fn run_carry(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let markets = MarketsClient::new(&config)?;
    let snapshot = carry_snapshot(&markets).await;
    if snapshot.rows.is_empty() {
        println!("no quoted bonds available");
        return Ok(());
    }

    println!("MEP: $ {:.2}", snapshot.mep);
    println!(
        "{:<6}  {:<10}  {:>5}  {:>9}  {:>8}  {:>11}  {:>11}",
        "BONO", "VENC", "DIAS", "PRECIO", "TEM", "MEP BE", "CARRY PEOR"
    );
    for row in &snapshot.rows {
        println!(
            "{:<6}  {}  {:>5}  {:>9.2}  {:>7.2}%  {:>11.2}  {:>10.1}%",
            row.symbol,
            format_date_ar(row.expiration),
            row.days_to_exp,
            row.bond_price,
            row.tem * 100.0,
            row.mep_breakeven,
            row.carry_worst * 100.0
        );
    }

    if snapshot.exit_simulation.is_empty() {
        println!("\nexit simulation window has passed");
        return Ok(());
    }
    println!("\nSalida anticipada");
    println!(
        "{:<6}  {:>5}  {:>9}  {:>9}  {:>9}  {:>9}",
        "BONO", "DIAS", "COMPRA", "VENTA", "DIRECTO", "TEA"
    );
    for row in &snapshot.exit_simulation {
        println!(
            "{:<6}  {:>5}  {:>9.2}  {:>9.2}  {:>8.1}%  {:>8.1}%",
            row.symbol,
            row.days_in,
            row.bond_price_in,
            row.bond_price_out,
            row.ars_direct_yield * 100.0,
            row.ars_tea * 100.0
        );
    }
    Ok(())
}
