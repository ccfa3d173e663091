//! SQLite implementation of [`ClubSearchIndex`].
//!
//! Text search is a `LIKE` over the Unicode lowercased name, description and
//! category where any whitespace separated term may match. Geo search uses an
//! equirectangular approximation: a bounding box prefilter followed by a
//! squared planar distance check, both evaluated by SQLite.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::club::{Club, ClubSearchFilter, ClubSortField, ClubSuggestion, GeoRadius};
use crate::storage::connection::DbConnection;
use crate::storage::repositories::club_repository::{fold_case, ClubRepository, CLUB_COLUMNS};
use crate::storage::traits::ClubSearchIndex;

/// Metres per degree of latitude
const METRES_PER_DEGREE: f64 = 111_320.0;

#[derive(Clone)]
pub struct SqliteClubSearchIndex {
    db: DbConnection,
}

impl SqliteClubSearchIndex {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn sort_column(field: ClubSortField) -> &'static str {
    match field {
        ClubSortField::Rating => "rating",
        ClubSortField::Price => "price",
        ClubSortField::Name => "name",
        ClubSortField::CreatedAt => "created_at",
        ClubSortField::ReviewCount => "review_count",
    }
}

/// Escape `LIKE` wildcards so user text matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_text_filter(query: &mut QueryBuilder<'_, Sqlite>, text: &str) {
    let folded = fold_case(text);
    let terms: Vec<String> = folded.split_whitespace().map(like_pattern).collect();
    if terms.is_empty() {
        return;
    }

    query.push(" AND (");
    for (i, pattern) in terms.into_iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push("text_folded LIKE ");
        query.push_bind(pattern);
        query.push(" ESCAPE '\\'");
    }
    query.push(")");
}

fn push_geo_filter(query: &mut QueryBuilder<'_, Sqlite>, near: &GeoRadius) {
    let lat = near.center.latitude;
    let lng = near.center.longitude;
    let metres_per_lng_degree = METRES_PER_DEGREE * lat.to_radians().cos().abs().max(1e-6);
    let lat_delta = near.max_distance_m / METRES_PER_DEGREE;
    let lng_delta = near.max_distance_m / metres_per_lng_degree;

    query.push(" AND latitude BETWEEN ");
    query.push_bind(lat - lat_delta);
    query.push(" AND ");
    query.push_bind(lat + lat_delta);
    query.push(" AND longitude BETWEEN ");
    query.push_bind(lng - lng_delta);
    query.push(" AND ");
    query.push_bind(lng + lng_delta);

    query.push(" AND ((longitude - ");
    query.push_bind(lng);
    query.push(") * ");
    query.push_bind(metres_per_lng_degree);
    query.push(") * ((longitude - ");
    query.push_bind(lng);
    query.push(") * ");
    query.push_bind(metres_per_lng_degree);
    query.push(") + ((latitude - ");
    query.push_bind(lat);
    query.push(") * ");
    query.push_bind(METRES_PER_DEGREE);
    query.push(") * ((latitude - ");
    query.push_bind(lat);
    query.push(") * ");
    query.push_bind(METRES_PER_DEGREE);
    query.push(") <= ");
    query.push_bind(near.max_distance_m * near.max_distance_m);
}

#[async_trait]
impl ClubSearchIndex for SqliteClubSearchIndex {
    async fn search(&self, filter: &ClubSearchFilter) -> Result<Vec<Club>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        query.push(CLUB_COLUMNS);
        query.push(" FROM clubs WHERE 1 = 1");

        if let Some(text) = filter.text.as_deref() {
            push_text_filter(&mut query, text);
        }

        if let Some(category) = filter.category.clone() {
            query.push(" AND category = ");
            query.push_bind(category);
        }

        if let Some(age) = filter.age {
            query.push(" AND age_min <= ");
            query.push_bind(age as i64);
            query.push(" AND age_max >= ");
            query.push_bind(age as i64);
        }

        if !filter.interests.is_empty() {
            query.push(
                " AND EXISTS (SELECT 1 FROM json_each(clubs.interests) ci \
                 WHERE ci.value IN (SELECT value FROM json_each(",
            );
            query.push_bind(serde_json::to_string(&filter.interests)?);
            query.push(")))");
        }

        if let Some(min_price) = filter.min_price {
            query.push(" AND price >= ");
            query.push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND price <= ");
            query.push_bind(max_price);
        }

        if let Some(near) = filter.near.as_ref() {
            push_geo_filter(&mut query, near);
        }

        query.push(" ORDER BY ");
        query.push(sort_column(filter.sort.field));
        query.push(if filter.sort.descending { " DESC" } else { " ASC" });
        query.push(", rowid");

        let rows = query.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(ClubRepository::club_from_row).collect()
    }

    async fn autocomplete(&self, text: &str, limit: u32) -> Result<Vec<ClubSuggestion>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category FROM clubs
            WHERE name_folded LIKE ? ESCAPE '\'
            ORDER BY rowid
            LIMIT ?
            "#,
        )
        .bind(like_pattern(&fold_case(text)))
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| -> Result<ClubSuggestion> {
                Ok(ClubSuggestion {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    category: row.try_get("category")?,
                })
            })
            .collect()
    }
}
