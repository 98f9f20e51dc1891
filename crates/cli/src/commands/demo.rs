use cartsim_core::catalog::{CartRandomness, CatalogSource};
use cartsim_core::config::{AppConfig, LoadOptions};
use cartsim_core::domain::customer::CustomerData;
use cartsim_core::domain::shipping::ShippingQuote;
use cartsim_core::flows::Page;
use cartsim_core::quoting::QuoteService;
use cartsim_core::storefront::Storefront;

use crate::commands::{live_storefront, runtime, CommandResult};
use crate::init_logging;
use crate::render::{page_title, render_notices, render_summary};

#[derive(Clone, Debug)]
pub struct DemoArgs {
    pub name: String,
    pub street: String,
    pub commune: String,
    pub phone: String,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoReport {
    pub transcript: Vec<String>,
    pub quote: Option<ShippingQuote>,
    pub last_error: Option<String>,
    pub final_page: Page,
}

impl DemoReport {
    pub fn transcript_text(&self) -> String {
        self.transcript.join("\n")
    }
}

/// Walks one session through generate, checkout, shipping and quote, stopping
/// at the first step that leaves the expected page.
pub async fn run_demo<C, Q, R>(
    storefront: &mut Storefront<C, Q, R>,
    customer: CustomerData,
) -> DemoReport
where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
{
    let mut transcript = Vec::new();

    let page = storefront.generate_cart().await;
    record(&mut transcript, storefront, "generate", page);
    if storefront.state().is_cart_empty() {
        return report(storefront, transcript);
    }

    let page = storefront.open_checkout();
    record(&mut transcript, storefront, "checkout", page);
    transcript.push(render_summary(&storefront.checkout_summary()));

    let page = storefront.open_shipping();
    record(&mut transcript, storefront, "shipping", page);
    if page != Page::Shipping {
        return report(storefront, transcript);
    }

    let page = storefront.request_quote(customer).await;
    record(&mut transcript, storefront, "quote", page);
    if storefront.state().quote.is_some() {
        transcript.push(render_summary(&storefront.checkout_summary()));
    }

    report(storefront, transcript)
}

fn record<C, Q, R>(
    transcript: &mut Vec<String>,
    storefront: &mut Storefront<C, Q, R>,
    step: &str,
    page: Page,
) where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
{
    transcript.push(format!("== {step} -> {}", page_title(page)));
    let notices = render_notices(&storefront.take_notices());
    if !notices.is_empty() {
        transcript.push(notices);
    }
}

fn report<C, Q, R>(storefront: &Storefront<C, Q, R>, transcript: Vec<String>) -> DemoReport
where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
{
    DemoReport {
        transcript,
        quote: storefront.state().quote.clone(),
        last_error: storefront.state().last_error.clone(),
        final_page: storefront.page(),
    }
}

pub fn run(args: DemoArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };
    init_logging(&config);

    let mut storefront = match live_storefront(&config, args.seed) {
        Ok(storefront) => storefront,
        Err(error) => return CommandResult::failure("demo", "http_client", error.to_string(), 3),
    };
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("demo", "runtime", error, 4),
    };

    let customer = CustomerData::new(args.name, args.street, args.commune, args.phone);
    let report = runtime.block_on(run_demo(&mut storefront, customer));
    outcome(&report)
}

pub fn outcome(report: &DemoReport) -> CommandResult {
    let result = match (&report.quote, &report.last_error) {
        (Some(quote), _) => CommandResult::success(
            "demo",
            format!("quoted shipping with {} for $ {:.2}", quote.courier, quote.price),
        ),
        (None, Some(error)) => CommandResult::failure("demo", "quote_unavailable", error, 6),
        (None, None) => CommandResult::failure(
            "demo",
            "flow_incomplete",
            format!("demo stopped on the {} page", page_title(report.final_page)),
            6,
        ),
    };
    result.with_transcript(&report.transcript_text())
}
