//! Fixed-rate table command handler.

use crate::analytics::fija::fija_snapshot;
use crate::analytics::format_date_ar;
use crate::config::ServiceConfig;
use crate::markets::MarketsClient;

/// Print the letras/bonos yield table plus the wallet and fund rates
/// quoted alongside it.
pub async fn run_fija(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let markets = MarketsClient::new(&config)?;
    let snapshot = fija_snapshot(&markets).await;
    if snapshot.rows.is_empty() {
        println!("no quoted instruments available");
    } else {
        println!(
            "{:<6}  {:<10}  {:>5}  {:>9}  {:>8}  {:>8}  {:>8}",
            "TICKER", "VENC", "DIAS", "PRECIO", "TNA", "TEM", "TEA"
        );
        for row in &snapshot.rows {
            println!(
                "{:<6}  {}  {:>5}  {:>9.2}  {:>7.1}%  {:>7.2}%  {:>7.1}%",
                row.ticker,
                format_date_ar(row.vencimiento),
                row.dias,
                row.px,
                row.tna * 100.0,
                row.tem * 100.0,
                row.tea * 100.0
            );
        }
    }

    if !snapshot.billeteras.is_empty() {
        println!("\nBilleteras y cuentas remuneradas");
        for option in &snapshot.billeteras {
            let limit = match option.limit {
                Some(limit) => format!("hasta $ {:.0}", limit),
                None => "sin tope".to_string(),
            };
            println!(
                "  {:<35}  TNA {:>6.2}%  {}",
                option.pretty_name, option.tna, limit
            );
        }
    }

    for fund in &snapshot.fondos {
        println!("\n{}: TNA {:.2}%", fund.nombre, fund.tna);
    }
    Ok(())
}
