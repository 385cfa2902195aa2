use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{domain::RegionId, protocol::TaxResult};
use tax_client::{
    format::{diff, format_currency, format_diff, format_name, format_percent},
    load_config, CalculationPhase, FormFields, HttpTaxApi, MunicipalityStore, TaxApi,
    TaxCalculation,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "taxcalc", about = "Swedish net salary calculator")]
struct Cli {
    /// Overrides TAX_API_BASE_URL and taxcalc.toml.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Regions {
        /// Query the regions endpoint instead of deriving regions from municipalities.
        #[arg(long)]
        remote: bool,
    },
    Municipalities {
        #[arg(long)]
        region: Option<String>,
    },
    Calculate {
        /// Municipality id or code, e.g. 0180.
        #[arg(long, default_value = "")]
        municipality: String,
        #[arg(long, default_value = "")]
        salary: String,
        /// Second municipality to compare against.
        #[arg(long)]
        compare: Option<String>,
        #[arg(long)]
        church_member: bool,
        #[arg(long)]
        pensioner: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut config = load_config();
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    info!(base_url = %config.base_url, "using tax service");

    let api: Arc<dyn TaxApi> = Arc::new(HttpTaxApi::new(&config)?);
    let store = MunicipalityStore::new(Arc::clone(&api));

    match cli.command {
        Command::Regions { remote } => {
            let regions = if remote {
                api.list_regions().await?
            } else {
                store.fetch_municipalities().await;
                ensure_loaded(&store)?;
                store.regions()
            };
            for region in regions {
                println!("{:<6} {}", region.code, format_name(&region.name));
            }
        }
        Command::Municipalities { region } => {
            store.fetch_municipalities().await;
            ensure_loaded(&store)?;
            store.set_selected_region(region.map(RegionId::from));
            for municipality in store.filtered_municipalities() {
                let rate = municipality
                    .municipal_tax_rate
                    .map(|rate| format!("{} %", format_percent(Some(rate * 100.0))))
                    .unwrap_or_default();
                println!(
                    "{:<6} {:<28} {:<24} {}",
                    municipality.code,
                    format_name(&municipality.name),
                    format_name(&municipality.region.name),
                    rate
                );
            }
        }
        Command::Calculate {
            municipality,
            salary,
            compare,
            church_member,
            pensioner,
        } => {
            store.fetch_municipalities().await;
            ensure_loaded(&store)?;

            let snapshot = store.snapshot();
            let resolve = |key: &str| {
                snapshot
                    .municipality_by_id_or_code(key)
                    .map(|m| m.id.to_string())
                    .unwrap_or_else(|| key.trim().to_string())
            };

            let mut fields = FormFields {
                municipality_id: resolve(municipality.as_str()),
                compare_mode: compare.is_some(),
                compare_municipality_id: compare.as_deref().map(resolve).unwrap_or_default(),
                church_member,
                is_pensioner: pensioner,
                ..FormFields::default()
            };
            fields.set_salary_input(&salary);

            let validation = fields.validation();
            let Some(requests) = fields.requests() else {
                for (field, message) in validation.errors.fields() {
                    eprintln!("{field}: {message}");
                }
                bail!("invalid input");
            };
            for id in std::iter::once(&requests.primary)
                .chain(requests.compare.as_ref())
                .map(|r| &r.municipality_id)
            {
                if store.municipality_by_id(id).is_none() {
                    bail!("unknown municipality: {id}");
                }
            }

            let calculation = TaxCalculation::new(Arc::clone(&api));
            calculation
                .calculate(requests.primary, requests.compare)
                .await;

            let state = calculation.snapshot();
            match (state.phase(), state.primary_result, state.compare_result) {
                (CalculationPhase::Success, Some(primary), compare) => {
                    print_result(&primary);
                    if let Some(compare) = compare {
                        println!();
                        print_result(&compare);
                        println!();
                        println!(
                            "Net difference: {} kr/month",
                            format_diff(diff(compare.net_monthly_salary, primary.net_monthly_salary))
                        );
                    }
                }
                _ => bail!(
                    "{}",
                    state
                        .error
                        .unwrap_or_else(|| "calculation did not complete".to_string())
                ),
            }
        }
    }

    Ok(())
}

fn ensure_loaded(store: &MunicipalityStore) -> Result<()> {
    if let Some(err) = store.error() {
        bail!("{err}");
    }
    Ok(())
}

fn print_result(result: &TaxResult) {
    println!(
        "{} ({})",
        format_name(&result.municipality_name),
        format_name(&result.region_name)
    );
    println!(
        "  Gross salary:     {:>10} kr/month",
        format_currency(Some(result.gross_monthly_salary))
    );
    println!(
        "  Total tax:        {:>10} kr/month",
        format_currency(Some(result.monthly_total_tax))
    );
    println!(
        "  Net salary:       {:>10} kr/month",
        format_currency(Some(result.net_monthly_salary))
    );
    println!(
        "  Yearly tax:       {:>10} kr",
        format_currency(Some(result.yearly_total_tax))
    );
    println!(
        "  Municipal rate:   {:>10} %",
        format_percent(Some(result.municipal_tax_rate * 100.0))
    );
    println!(
        "  Regional rate:    {:>10} %",
        format_percent(Some(result.regional_tax_rate * 100.0))
    );
    println!(
        "  Effective rate:   {:>10} %",
        format_percent(Some(result.effective_tax_rate * 100.0))
    );
}
