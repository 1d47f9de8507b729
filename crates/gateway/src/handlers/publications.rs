//! Publication read handlers

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use spacebio_common::{
    db::{
        models::Publication,
        query::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT},
        FilterOptions, PublicationQuery,
    },
    errors::{AppError, Result},
};

/// Query string for the publication listing.
///
/// `organisms` and `research_areas` are comma-separated. A year of `0`
/// leaves that side of the range open.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListParams {
    #[validate(length(max = 500))]
    pub q: Option<String>,

    pub year_from: Option<i32>,

    pub year_to: Option<i32>,

    pub organisms: Option<String>,

    pub research_areas: Option<String>,

    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u64>,
}

impl ListParams {
    pub fn into_query(self) -> PublicationQuery {
        PublicationQuery {
            search: self
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            year_from: self.year_from.filter(|&y| y != 0),
            year_to: self.year_to.filter(|&y| y != 0),
            organisms: split_csv(self.organisms.as_deref()),
            research_areas: split_csv(self.research_areas.as_deref()),
            limit: self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT),
        }
    }
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Serialize)]
pub struct ListResponse {
    pub publications: Vec<Publication>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Filtered listing, newest year first
pub async fn list_publications(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>> {
    let Query(params) = params.map_err(|rejection| AppError::InvalidFormat {
        message: rejection.body_text(),
    })?;

    params.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let query = params.into_query();
    let publications = state.store.list_publications(&query).await?;

    tracing::debug!(
        search = ?query.search,
        results = publications.len(),
        "Publication listing served"
    );

    Ok(Json(ListResponse {
        count: publications.len(),
        publications,
    }))
}

/// Total number of stored publications
pub async fn count_publications(State(state): State<AppState>) -> Result<Json<CountResponse>> {
    let count = state.store.count_publications().await?;
    Ok(Json(CountResponse { count }))
}

/// Distinct organisms, research areas, and experiment types
pub async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptions>> {
    Ok(Json(state.store.filter_options().await?))
}

/// Get a single publication by ID
pub async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Publication>> {
    state
        .store
        .find_publication(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::PublicationNotFound { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_normalization() {
        let params = ListParams {
            q: Some("  microgravity ".into()),
            year_from: Some(0),
            year_to: Some(2020),
            organisms: Some("Mus musculus, ,Arabidopsis thaliana".into()),
            research_areas: None,
            limit: None,
        };

        let query = params.into_query();
        assert_eq!(query.search.as_deref(), Some("microgravity"));
        assert_eq!(query.year_from, None);
        assert_eq!(query.year_to, Some(2020));
        assert_eq!(query.organisms, vec!["Mus musculus", "Arabidopsis thaliana"]);
        assert!(query.research_areas.is_empty());
        assert_eq!(query.limit, DEFAULT_LIST_LIMIT);
    }

    #[test]
    fn test_blank_search_is_none() {
        let params = ListParams {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(params.into_query().search, None);
    }

    #[test]
    fn test_limit_validation() {
        let params = ListParams {
            limit: Some(500),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = ListParams {
            limit: Some(200),
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }
}
