use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::domain::cart::CartLine;
use crate::domain::product::{CatalogPage, CatalogProduct};
use crate::errors::{CartError, LOAD_CART_FAILED};

pub const MIN_CART_ITEMS: u32 = 1;
pub const MAX_CART_ITEMS: u32 = 10;
pub const MIN_LINE_QUANTITY: u32 = 1;
pub const MAX_LINE_QUANTITY: u32 = 5;
pub const FULL_SCAN_PAGE_SIZE: u32 = 10;

/// Read access to a paginated product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, limit: u32, skip: u64) -> Result<CatalogPage, CartError>;
}

#[async_trait]
impl<T> CatalogSource for std::sync::Arc<T>
where
    T: CatalogSource + ?Sized,
{
    async fn fetch_page(&self, limit: u32, skip: u64) -> Result<CatalogPage, CartError> {
        (**self).fetch_page(limit, skip).await
    }
}

/// Random draws used when building a cart.
pub trait CartRandomness: Send {
    /// Number of distinct products, in `MIN_CART_ITEMS..=MAX_CART_ITEMS`.
    fn item_count(&mut self) -> u32;
    /// Offset into the catalog, in `0..=max_skip`.
    fn skip(&mut self, max_skip: u64) -> u64;
    /// Units of one product, in `MIN_LINE_QUANTITY..=MAX_LINE_QUANTITY`.
    fn quantity(&mut self) -> u32;
}

#[derive(Debug)]
pub struct RngRandomness<R> {
    rng: R,
}

impl RngRandomness<StdRng> {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R> CartRandomness for RngRandomness<R>
where
    R: Rng + Send,
{
    fn item_count(&mut self) -> u32 {
        self.rng.gen_range(MIN_CART_ITEMS..=MAX_CART_ITEMS)
    }

    fn skip(&mut self, max_skip: u64) -> u64 {
        self.rng.gen_range(0..=max_skip)
    }

    fn quantity(&mut self) -> u32 {
        self.rng.gen_range(MIN_LINE_QUANTITY..=MAX_LINE_QUANTITY)
    }
}

/// The slice of the catalog a random cart is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogWindow {
    pub limit: u32,
    pub skip: u64,
}

impl CatalogWindow {
    /// Draws a window that stays inside `0..total`.
    pub fn plan<R>(total: u64, randomness: &mut R) -> Self
    where
        R: CartRandomness + ?Sized,
    {
        let limit = randomness.item_count().clamp(MIN_CART_ITEMS, MAX_CART_ITEMS);
        let max_skip = total.saturating_sub(u64::from(limit));
        let skip = randomness.skip(max_skip).min(max_skip);
        Self { limit, skip }
    }
}

/// Builds a random cart from the catalog.
///
/// An empty window is retried once from the start of the catalog with the
/// same size. Any source failure is reported as a network error.
pub async fn fetch_random_cart<C, R>(
    source: &C,
    randomness: &mut R,
) -> Result<Vec<CartLine>, CartError>
where
    C: CatalogSource + ?Sized,
    R: CartRandomness + ?Sized,
{
    let total = source.fetch_page(1, 0).await.map_err(catalog_failure)?.total;
    if total == 0 {
        info!(event_name = "catalog.random_cart.empty_catalog", "catalog has no products");
        return Ok(Vec::new());
    }

    let window = CatalogWindow::plan(total, randomness);
    let mut products =
        source.fetch_page(window.limit, window.skip).await.map_err(catalog_failure)?.products;

    if products.is_empty() {
        warn!(
            event_name = "catalog.random_cart.empty_window",
            limit = window.limit,
            skip = window.skip,
            total,
            "catalog window came back empty; retrying from the first product"
        );
        products = source.fetch_page(window.limit, 0).await.map_err(catalog_failure)?.products;
    }

    let lines: Vec<CartLine> = products
        .iter()
        .map(|product| CartLine::from_product(product, line_quantity(randomness)))
        .collect();

    info!(
        event_name = "catalog.random_cart.generated",
        lines = lines.len(),
        limit = window.limit,
        skip = window.skip,
        total,
        "random cart generated"
    );
    Ok(lines)
}

/// Reads the whole catalog page by page.
pub async fn fetch_all_products<C>(
    source: &C,
    page_size: u32,
) -> Result<Vec<CatalogProduct>, CartError>
where
    C: CatalogSource + ?Sized,
{
    let page_size = page_size.max(1);
    let mut products = Vec::new();
    let mut skip = 0_u64;
    let mut total: Option<u64> = None;

    loop {
        let page = source.fetch_page(page_size, skip).await?;
        let expected = *total.get_or_insert(page.total);
        let fetched = page.products.len();
        products.extend(page.products);
        skip += u64::from(page_size);

        if fetched == 0 || skip >= expected {
            break;
        }
    }

    Ok(products)
}

fn line_quantity<R>(randomness: &mut R) -> u32
where
    R: CartRandomness + ?Sized,
{
    randomness.quantity().clamp(MIN_LINE_QUANTITY, MAX_LINE_QUANTITY)
}

fn catalog_failure(error: CartError) -> CartError {
    warn!(event_name = "catalog.random_cart.failed", error = %error, "catalog request failed");
    CartError::Network(LOAD_CART_FAILED.to_owned())
}
