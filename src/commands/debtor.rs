//! Debtor registry command handler.

use crate::analytics::format_date_ar;
use crate::analytics::inflation::month_name_es;
use crate::bcra::{BcraClient, ChequeResponse, DebtHistoryResponse, DebtResponse};
use crate::config::{PipelineConfig, ServiceConfig};

/// Consolidated report for a CUIT: current debts, the 24-month history
/// and rejected cheques.
pub async fn run_debtor(
    config: ServiceConfig,
    cuit: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = BcraClient::new(&config, PipelineConfig::default()).await?;

    match client.debts(&cuit).await? {
        Some(debts) => print_debts(&debts),
        None => println!("CUIT {}: sin registros en la central de deudores", cuit),
    }

    match client.debt_history(&cuit).await? {
        Some(history) => print_history(&history),
        None => println!("\nsin historial de deudas"),
    }

    match client.rejected_cheques(&cuit).await? {
        Some(cheques) => print_cheques(&cheques),
        None => println!("\nsin cheques rechazados"),
    }

    Ok(())
}

/// BCRA regulatory classification, 1 (normal) through 6.
fn situation_label(situacion: u32) -> &'static str {
    match situacion {
        1 => "Normal",
        2 => "Riesgo bajo",
        3 => "Riesgo medio",
        4 => "Riesgo alto",
        5 => "Irrecuperable",
        6 => "Irrecuperable por disposición técnica",
        _ => "Desconocida",
    }
}

/// Render a `YYYYMM` period as a Spanish label ("202501" -> "Enero 2025").
fn format_period(period: &str) -> String {
    if period.len() != 6 {
        return period.to_string();
    }
    let (year, month) = period.split_at(4);
    let name = match month.parse::<u32>() {
        Ok(m @ 1..=12) => month_name_es(m),
        _ => return period.to_string(),
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!(
            "{}{} {}",
            first.to_uppercase(),
            chars.as_str(),
            year
        ),
        None => period.to_string(),
    }
}

fn print_debts(debts: &DebtResponse) {
    let debtor = &debts.results;
    println!(
        "{} ({})",
        debtor.denominacion.as_deref().unwrap_or("(sin denominación)"),
        debtor.identificacion
    );
    for period in debtor.periodos.iter().flatten() {
        if let Some(periodo) = &period.periodo {
            println!("\nPeríodo {} (montos en miles de $)", format_period(periodo));
        }
        for entity in period.entidades.iter().flatten() {
            let situacion = entity.situacion.unwrap_or(0);
            println!(
                "  {:<45}  situación {} ({})  {:>14.1}",
                entity.entidad.as_deref().unwrap_or("?"),
                situacion,
                situation_label(situacion),
                entity.monto.unwrap_or(0.0)
            );
        }
    }
}

fn print_history(history: &DebtHistoryResponse) {
    println!("\nHistorial (montos en miles de $)");
    for period in history.results.periodos.iter().flatten() {
        let entities = period.entidades.as_deref().unwrap_or(&[]);
        let worst = entities.iter().filter_map(|e| e.situacion).max().unwrap_or(0);
        let total: f64 = entities.iter().filter_map(|e| e.monto).sum();
        println!(
            "  {:<16}  {} entidades  peor situación {}  {:>14.1}",
            period.periodo.as_deref().map(format_period).unwrap_or_default(),
            entities.len(),
            worst,
            total
        );
    }
}

fn print_cheques(cheques: &ChequeResponse) {
    println!("\nCheques rechazados");
    let causales = cheques.results.causales.as_deref().unwrap_or(&[]);
    if causales.is_empty() {
        println!("  (ninguno)");
        return;
    }
    for causal in causales {
        println!("  Causal: {}", causal.causal.as_deref().unwrap_or("?"));
        for entity in causal.entidades.iter().flatten() {
            for detail in entity.detalle.iter().flatten() {
                println!(
                    "    cheque {:>10}  rechazado {}  $ {:>12.2}  {}",
                    detail.nro_cheque,
                    format_date_ar(detail.fecha_rechazo),
                    detail.monto,
                    if detail.fecha_pago.is_some() {
                        "pagado"
                    } else {
                        "impago"
                    }
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_period() {
        assert_eq!(format_period("202501"), "Enero 2025");
        assert_eq!(format_period("202412"), "Diciembre 2024");
        assert_eq!(format_period("202500"), "202500");
        assert_eq!(format_period("2025"), "2025");
        assert_eq!(format_period("2025ab"), "2025ab");
    }

    #[test]
    fn test_situation_labels() {
        assert_eq!(situation_label(1), "Normal");
        assert_eq!(situation_label(5), "Irrecuperable");
        assert_eq!(situation_label(9), "Desconocida");
    }
}
