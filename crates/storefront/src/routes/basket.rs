//! Cart and wishlist route handlers.
//!
//! One set of handlers serves both lists; the router attaches the
//! [`ListKind`] as a request extension. Mutations use HTMX: they answer
//! with a fragment and an `HX-Trigger` naming the list that changed, which
//! the header badge listens for.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{CurrencyCode, LineId, Money, ProductId};

use crate::basket::{BasketError, BasketView, ListKind};
use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::LineItem;
use crate::state::AppState;

// =============================================================================
// View Models
// =============================================================================

/// One line as shown on the basket page.
#[derive(Debug, Clone)]
pub struct LineView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub variant: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub on_sale: bool,
}

impl LineView {
    fn new(line: &LineItem, currency: CurrencyCode) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.product.name.clone(),
            slug: line.product.slug.clone(),
            variant: line.variant_label(),
            image: line.product.images.first().cloned(),
            quantity: line.quantity,
            unit_price: Money::new(line.product.unit_price(), currency).display(),
            line_total: Money::new(line.line_total(), currency).display(),
            on_sale: line.product.discount_price.is_some(),
        }
    }
}

/// Basket display data for templates.
#[derive(Debug, Clone)]
pub struct BasketPage {
    pub kind: &'static str,
    pub title: &'static str,
    pub is_wishlist: bool,
    pub lines: Vec<LineView>,
    pub total: String,
    pub count: u32,
    pub signed_in: bool,
}

impl BasketPage {
    fn new(view: &BasketView, currency: CurrencyCode, signed_in: bool) -> Self {
        Self {
            kind: view.kind.as_str(),
            title: match view.kind {
                ListKind::Cart => "Your cart",
                ListKind::Wishlist => "Your wishlist",
            },
            is_wishlist: view.kind == ListKind::Wishlist,
            lines: view
                .lines
                .iter()
                .map(|line| LineView::new(line, currency))
                .collect(),
            total: Money::new(view.total, currency).display(),
            count: view.count,
            signed_in,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Basket page template.
#[derive(Template, WebTemplate)]
#[template(path = "basket/show.html")]
pub struct BasketShowTemplate {
    pub basket: BasketPage,
}

/// Basket lines fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/basket_lines.html")]
pub struct BasketLinesTemplate {
    pub basket: BasketPage,
}

/// Count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/badge.html")]
pub struct BadgeTemplate {
    pub kind: &'static str,
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to basket form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl AddForm {
    // Browsers submit empty selects as "", which is not a variant.
    fn size(&self) -> Option<&str> {
        self.size.as_deref().filter(|s| !s.is_empty())
    }

    fn color(&self) -> Option<&str> {
        self.color.as_deref().filter(|c| !c.is_empty())
    }
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Form data naming one line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub line_id: String,
}

fn parse_line_id(raw: &str) -> Result<LineId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid line id".to_string()))
}

/// Reject cart quantities the catalog cannot cover.
///
/// `wanted` is the line's quantity after the change. Wishlists are not
/// limited by stock.
async fn ensure_in_stock(
    state: &AppState,
    kind: ListKind,
    product_id: ProductId,
    wanted: u32,
) -> Result<()> {
    if kind != ListKind::Cart {
        return Ok(());
    }

    let product = ProductRepository::new(state.pool())
        .get_snapshot(product_id)
        .await?
        .ok_or(BasketError::ProductNotFound(product_id))?;

    let available = product.available();
    if wanted > available {
        return Err(AppError::BadRequest(format!(
            "Only {available} of {} in stock",
            product.name
        )));
    }
    Ok(())
}

fn updated<T: IntoResponse>(kind: ListKind, body: T) -> Response {
    (AppendHeaders([("HX-Trigger", kind.updated_event())]), body).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the basket page.
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn show(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<BasketShowTemplate> {
    let basket = state.basket(kind, &session, user.as_ref()).await?;

    Ok(BasketShowTemplate {
        basket: BasketPage::new(&basket.view(), state.config().currency, user.is_some()),
    })
}

/// Get the count badge (HTMX).
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn count(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<BadgeTemplate> {
    let basket = state.basket(kind, &session, user.as_ref()).await?;

    Ok(BadgeTemplate {
        kind: kind.as_str(),
        count: basket.count(),
    })
}

/// Add a product (HTMX).
///
/// Merges into an existing line with the same size and color. Returns the
/// updated badge.
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn add(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    let mut basket = state.basket(kind, &session, user.as_ref()).await?;

    let already = basket
        .lines()
        .iter()
        .find(|line| line.matches(form.product_id, form.size(), form.color()))
        .map_or(0, |line| line.quantity);
    ensure_in_stock(&state, kind, form.product_id, already.saturating_add(quantity)).await?;

    let line_id = basket
        .add(
            form.product_id,
            quantity,
            form.size().map(str::to_owned),
            form.color().map(str::to_owned),
        )
        .await?;

    add_breadcrumb(
        kind.as_str(),
        "Added item",
        &[
            ("product_id", form.product_id.to_string()),
            ("line_id", line_id.to_string()),
        ],
    );

    Ok(updated(
        kind,
        BadgeTemplate {
            kind: kind.as_str(),
            count: basket.count(),
        },
    ))
}

/// Update a line's quantity (HTMX).
///
/// A quantity of zero removes the line.
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<UpdateForm>,
) -> Result<Response> {
    let line_id = parse_line_id(&form.line_id)?;
    let mut basket = state.basket(kind, &session, user.as_ref()).await?;

    let product_id = basket
        .line(line_id)
        .map(|line| line.product_id)
        .ok_or(BasketError::LineNotFound(line_id))?;
    if form.quantity > 0 {
        ensure_in_stock(&state, kind, product_id, form.quantity).await?;
    }

    basket.set_quantity(line_id, form.quantity).await?;

    Ok(updated(
        kind,
        BasketLinesTemplate {
            basket: BasketPage::new(&basket.view(), state.config().currency, user.is_some()),
        },
    ))
}

/// Remove a line (HTMX).
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn remove(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let line_id = parse_line_id(&form.line_id)?;
    let mut basket = state.basket(kind, &session, user.as_ref()).await?;

    basket.remove(line_id).await?;

    Ok(updated(
        kind,
        BasketLinesTemplate {
            basket: BasketPage::new(&basket.view(), state.config().currency, user.is_some()),
        },
    ))
}

/// Empty the basket (HTMX).
#[instrument(skip(state, session, user), fields(kind = %kind))]
pub async fn clear(
    State(state): State<AppState>,
    Extension(kind): Extension<ListKind>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let mut basket = state.basket(kind, &session, user.as_ref()).await?;

    basket.clear().await?;

    Ok(updated(
        kind,
        BasketLinesTemplate {
            basket: BasketPage::new(&basket.view(), state.config().currency, user.is_some()),
        },
    ))
}

/// Move a wishlist line into the cart (HTMX).
///
/// The cart add happens first; if it fails the wishlist is left alone.
#[instrument(skip(state, session, user))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<LineForm>,
) -> Result<Response> {
    let line_id = parse_line_id(&form.line_id)?;
    let mut wishlist = state
        .basket(ListKind::Wishlist, &session, user.as_ref())
        .await?;
    let line = wishlist
        .line(line_id)
        .cloned()
        .ok_or(BasketError::LineNotFound(line_id))?;

    let mut cart = state
        .basket(ListKind::Cart, &session, user.as_ref())
        .await?;
    let already = cart
        .lines()
        .iter()
        .find(|l| l.matches(line.product_id, line.size.as_deref(), line.color.as_deref()))
        .map_or(0, |l| l.quantity);
    ensure_in_stock(
        &state,
        ListKind::Cart,
        line.product_id,
        already.saturating_add(line.quantity),
    )
    .await?;

    cart.add(
        line.product_id,
        line.quantity,
        line.size.clone(),
        line.color.clone(),
    )
    .await?;
    wishlist.remove(line_id).await?;

    tracing::info!(line_id = %line_id, product_id = %line.product_id, "moved wishlist line to cart");

    Ok((
        AppendHeaders([(
            "HX-Trigger",
            format!(
                "{}, {}",
                ListKind::Cart.updated_event(),
                ListKind::Wishlist.updated_event()
            ),
        )]),
        BasketLinesTemplate {
            basket: BasketPage::new(&wishlist.view(), state.config().currency, user.is_some()),
        },
    )
        .into_response())
}
