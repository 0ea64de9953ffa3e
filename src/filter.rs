// src/filter.rs
//
// Filter resolution engine: turns the raw text-valued query parameters of
// GET /api/listings into a composed SQL query, including the two-stage
// township -> region-id resolution and pagination.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::listing::{ListingDetailRow, ListingPage, ListingQueryParams, ListingResponse},
};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Upper bound on the page number. Anything past it returns the same empty
/// page, and capping keeps the OFFSET arithmetic far from i64 overflow.
pub const MAX_PAGE: i64 = 100_000;

/// Shared SELECT for listing reads: the listing row plus its region and
/// owner expanded through aliased JOIN columns.
pub const LISTING_SELECT: &str = "\
SELECT l.id, l.title, l.description, l.price, l.images, l.type, l.category, \
l.region_id, l.owner_id, l.amenities, l.deposit, l.is_available, l.is_featured, \
l.views, l.contact_phone, l.contact_whatsapp, l.contact_email, l.created_at, \
r.name AS region_name, r.township AS region_township, r.city AS region_city, \
r.province AS region_province, \
u.name AS owner_name, u.email AS owner_email, u.phone AS owner_phone \
FROM listings l \
JOIN regions r ON r.id = l.region_id \
JOIN users u ON u.id = l.owner_id";

/// Whitelisted sort keys. Anything else on the `sort` parameter is a 400.
///
/// A secondary `id` column keeps the order total, so pagination stays stable
/// when many rows share a creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
    PriceAsc,
    PriceDesc,
    ViewsDesc,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "-createdAt" => Some(SortKey::CreatedAtDesc),
            "createdAt" => Some(SortKey::CreatedAtAsc),
            "price" => Some(SortKey::PriceAsc),
            "-price" => Some(SortKey::PriceDesc),
            "-views" => Some(SortKey::ViewsDesc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortKey::CreatedAtDesc => "l.created_at DESC, l.id DESC",
            SortKey::CreatedAtAsc => "l.created_at ASC, l.id ASC",
            SortKey::PriceAsc => "l.price ASC, l.id ASC",
            SortKey::PriceDesc => "l.price DESC, l.id DESC",
            SortKey::ViewsDesc => "l.views DESC, l.id DESC",
        }
    }
}

/// The typed, validated form of the listing search parameters.
///
/// Numeric parameters arrive as text and are parsed exactly once, here.
/// Malformed numbers are rejected with a 400 rather than silently coerced.
#[derive(Debug, Default)]
pub struct ListingFilter {
    pub property_type: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub region_id: Option<i64>,
    pub township: Option<String>,
    pub amenities: Vec<String>,
    pub page: i64,
    pub limit: i64,
    pub sort: SortKey,
}

impl ListingFilter {
    pub fn from_params(params: ListingQueryParams) -> Result<Self, AppError> {
        let page = parse_positive("page", params.page)?.unwrap_or(1).min(MAX_PAGE);
        let limit = parse_positive("limit", params.limit)?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let sort = match non_empty(params.sort) {
            Some(raw) => SortKey::parse(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown sort key '{}'", raw)))?,
            None => SortKey::default(),
        };

        let amenities = match non_empty(params.amenities) {
            Some(raw) => {
                let mut tokens: Vec<String> = Vec::new();
                for token in raw.split(',') {
                    let token = token.trim().to_lowercase();
                    if !token.is_empty() && !tokens.contains(&token) {
                        tokens.push(token);
                    }
                }
                tokens
            }
            None => Vec::new(),
        };

        Ok(ListingFilter {
            property_type: non_empty(params.property_type),
            category: non_empty(params.category),
            min_price: parse_number("minPrice", params.min_price)?,
            max_price: parse_number("maxPrice", params.max_price)?,
            region_id: parse_number("region", params.region)?,
            township: non_empty(params.township),
            amenities,
            page,
            limit,
            sort,
        })
    }
}

/// Empty query-string values count as absent filters.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<i64>, AppError> {
    match non_empty(value) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be a number", name))),
        None => Ok(None),
    }
}

fn parse_positive(name: &str, value: Option<String>) -> Result<Option<i64>, AppError> {
    match parse_number(name, value)? {
        Some(n) if n < 1 => Err(AppError::BadRequest(format!(
            "{} must be a positive number",
            name
        ))),
        other => Ok(other),
    }
}

/// Wraps a search term in `%...%`, escaping LIKE metacharacters so the
/// user's text is matched literally. Queries using the result must carry
/// `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Resolves a township filter to the set of matching active region ids.
///
/// Policy: case-insensitive substring match ("soweto" matches "Soweto", and
/// "Soweto" also matches "Sowetoville"). SQLite's LIKE is case-insensitive
/// for ASCII, so the pattern needs no folding.
pub async fn resolve_township_region_ids(
    pool: &SqlitePool,
    township: &str,
) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM regions WHERE is_active = 1 AND township LIKE ? ESCAPE '\\'",
    )
    .bind(like_pattern(township))
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Appends the composed WHERE clause to `builder`.
///
/// `region_ids` is the township resolution result; when present it replaces
/// any `region` equality filter (township wins when both are supplied).
fn push_predicates(
    builder: &mut QueryBuilder<'static, Sqlite>,
    filter: &ListingFilter,
    region_ids: Option<&[i64]>,
) {
    builder.push(" WHERE l.is_available = 1");

    if let Some(property_type) = &filter.property_type {
        builder.push(" AND l.type = ");
        builder.push_bind(property_type.clone());
    }
    if let Some(category) = &filter.category {
        builder.push(" AND l.category = ");
        builder.push_bind(category.clone());
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND l.price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND l.price <= ");
        builder.push_bind(max);
    }

    match region_ids {
        Some(ids) => {
            builder.push(" AND l.region_id IN (");
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            builder.push(")");
        }
        None => {
            if let Some(region_id) = filter.region_id {
                builder.push(" AND l.region_id = ");
                builder.push_bind(region_id);
            }
        }
    }

    // Intersection semantics: the listing matches if it has at least one of
    // the requested amenities. Unknown tokens just never match.
    if !filter.amenities.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM json_each(l.amenities) WHERE json_each.value IN (",
        );
        let mut separated = builder.separated(", ");
        for amenity in &filter.amenities {
            separated.push_bind(amenity.clone());
        }
        builder.push("))");
    }
}

/// Executes the filter against the listings table and returns the paginated
/// envelope. `total` always reflects the full filtered set, independent of
/// page and limit.
///
/// At most two sequential round trips: the township resolve and the
/// count + page pair.
pub async fn execute(pool: &SqlitePool, filter: &ListingFilter) -> Result<ListingPage, AppError> {
    let resolved = match &filter.township {
        Some(township) => {
            let ids = resolve_township_region_ids(pool, township).await?;
            if ids.is_empty() {
                // No region matches the township: the listing query could
                // never match, so skip it entirely.
                return Ok(ListingPage {
                    listings: Vec::new(),
                    total_pages: 0,
                    current_page: filter.page,
                    total: 0,
                });
            }
            Some(ids)
        }
        None => None,
    };
    let region_ids = resolved.as_deref();

    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM listings l");
    push_predicates(&mut count_query, filter, region_ids);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query = QueryBuilder::new(LISTING_SELECT);
    push_predicates(&mut page_query, filter, region_ids);
    page_query.push(" ORDER BY ");
    page_query.push(filter.sort.as_sql());
    page_query.push(" LIMIT ");
    page_query.push_bind(filter.limit);
    page_query.push(" OFFSET ");
    page_query.push_bind((filter.page - 1) * filter.limit);

    let rows: Vec<ListingDetailRow> = page_query.build_query_as().fetch_all(pool).await?;

    Ok(ListingPage {
        listings: rows.into_iter().map(ListingResponse::from).collect(),
        total_pages: (total + filter.limit - 1) / filter.limit,
        current_page: filter.page,
        total,
    })
}
