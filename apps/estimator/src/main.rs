use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::normalize_base_url, load_settings, FormController, Settings, SubmitOutcome,
};
use shared::{
    domain::{is_known_location, BooleanField, FormField, KNOWN_LOCATIONS},
    format::{currency_symbol, format_price, Grouping},
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "estimator", about = "Navi Mumbai property price estimates")]
struct Cli {
    /// Prediction service base URL; overrides estimator.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit property details and print the estimated price.
    Predict(PredictArgs),
    /// Ask the prediction service whether it is up.
    Health,
    /// List the locations the model was trained on.
    Locations,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[arg(long)]
    location: String,
    #[arg(long)]
    area_sqft: String,
    #[arg(long)]
    bhk: String,
    #[arg(long)]
    bathrooms: String,
    /// Age of the property in years; blank means new.
    #[arg(long = "age", default_value = "")]
    age_of_property: String,
    #[arg(long)]
    parking: bool,
    #[arg(long)]
    lift: bool,
    /// Raw form entry applied after the flags above, e.g. `--set parking=1`.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    /// Group digits in lakh/crore (85,00,000) instead of thousands.
    #[arg(long)]
    indian_grouping: bool,
    /// Send the form even if it breaks the input limits.
    #[arg(long)]
    skip_checks: bool,
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(url) = cli.api_url.as_deref().and_then(normalize_base_url) {
        settings.api_base_url = url;
    }

    match cli.command {
        Command::Predict(args) => run_predict(&settings, args).await,
        Command::Health => run_health(&settings).await,
        Command::Locations => {
            for location in KNOWN_LOCATIONS {
                println!("{location}");
            }
            Ok(())
        }
    }
}

async fn run_predict(settings: &Settings, args: PredictArgs) -> Result<()> {
    let controller = FormController::from_settings(settings)
        .context("failed to configure prediction service")?;

    controller
        .update_field(FormField::Location, args.location)
        .await;
    controller
        .update_field(FormField::AreaSqft, args.area_sqft)
        .await;
    controller.update_field(FormField::Bhk, args.bhk).await;
    controller
        .update_field(FormField::Bathrooms, args.bathrooms)
        .await;
    controller
        .update_field(FormField::AgeOfProperty, args.age_of_property)
        .await;
    controller
        .set_boolean(BooleanField::Parking, args.parking)
        .await;
    controller.set_boolean(BooleanField::Lift, args.lift).await;
    for raw in &args.overrides {
        let (field, value) = parse_assignment(raw)?;
        controller.update_field(field, value).await;
    }

    let form = controller.snapshot().await.form;
    if !is_known_location(&form.location) {
        warn!(location = %form.location, "location is not one the model was trained on");
    }
    if !args.skip_checks {
        let violations = form.constraint_violations();
        if !violations.is_empty() {
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            bail!("form is incomplete: {details}");
        }
    }

    let grouping = if args.indian_grouping {
        Grouping::Indian
    } else {
        Grouping::International
    };

    match controller.submit().await {
        SubmitOutcome::Predicted(result) => {
            let formatted = format_price(result.predicted_price, grouping);
            if args.json {
                let out = serde_json::json!({
                    "predicted_price": result.predicted_price,
                    "currency": result.currency,
                    "formatted": formatted,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let symbol = currency_symbol(&result.currency).unwrap_or_default();
                println!("Estimated value: {symbol}{formatted}");
            }
            Ok(())
        }
        SubmitOutcome::Failed(message) => bail!("prediction failed: {message}"),
        SubmitOutcome::Superseded { token, latest } => {
            bail!("prediction request {token} was superseded by request {latest}")
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(FormField, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got `{raw}`");
    };
    let Some(field) = FormField::from_key(key.trim()) else {
        let known = FormField::ALL.map(FormField::key).join(", ");
        bail!("unknown form field `{}` (expected one of: {known})", key.trim());
    };
    Ok((field, value.to_string()))
}

async fn run_health(settings: &Settings) -> Result<()> {
    let controller = FormController::from_settings(settings)
        .context("failed to configure prediction service")?;
    let health = controller
        .check_health()
        .await
        .with_context(|| format!("health check against {} failed", settings.api_base_url))?;
    println!("{} (version {})", health.status, health.version);
    Ok(())
}
