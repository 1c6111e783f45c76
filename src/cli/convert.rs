use super::ui;
use crate::core::{Conversion, Converter, Effect, RateService};
use anyhow::{Result, anyhow, bail};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Converts once, without debouncing, applying the same validation and
/// result rules as the interactive form.
pub async fn convert_once(
    service: &dyn RateService,
    amount: &str,
    from: &str,
    to: &str,
) -> Result<Conversion> {
    for code in [from, to] {
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("Invalid currency code: {code:?}");
        }
    }
    let mut converter = Converter::new(&from.to_uppercase(), &to.to_uppercase());

    if let Effect::Schedule(ticket, request) = converter.set_amount(amount) {
        converter.begin(ticket);
        let outcome = service.convert(&request, &CancellationToken::new()).await;
        if let Err(e) = &outcome {
            debug!(error = %e, "Conversion request failed");
        }
        converter.finish(ticket, &request, outcome);
    }

    let view = converter.view();
    if let Some(error) = view.error {
        return Err(anyhow!(error));
    }
    view.result
        .clone()
        .ok_or_else(|| anyhow!("Please enter an amount to convert"))
}

pub async fn run(service: &dyn RateService, amount: &str, from: &str, to: &str) -> Result<()> {
    let from = from.to_uppercase();
    let result = convert_once(service, amount, &from, to).await?;

    let mut lines = ui::conversion_lines(&result, &from).into_iter();
    if let Some(headline) = lines.next() {
        println!("{}", ui::style_text(&headline, ui::StyleType::ResultValue));
    }
    for line in lines {
        println!("{}", ui::style_text(&line, ui::StyleType::Subtle));
    }
    Ok(())
}
