//! POI Search Port
//!
//! Points of interest and geocoding (hotels, metro stations, scenic spots).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, GeoPoint};

/// A point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    /// District name (`adname` in Amap responses)
    pub district: Option<String>,
    pub tel: Option<String>,
    pub location: Option<GeoPoint>,
    /// Distance from the search centre, for around-searches
    pub distance_m: Option<f64>,
    /// Semicolon-separated category path, e.g. `风景名胜;公园广场;公园`
    pub category: Option<String>,
    pub rating: Option<String>,
}

/// Service interface for POI lookups
#[async_trait]
pub trait PoiSearchService: Send + Sync {
    /// Address or landmark to coordinates
    async fn geocode(&self, address: &str, city: Option<&str>)
        -> Result<Option<GeoPoint>, DomainError>;

    /// Keyword / type search inside a city
    async fn search_text(
        &self,
        keywords: &str,
        city: Option<&str>,
        types: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError>;

    /// Keyword search within `radius_m` of `center`, nearest first
    async fn search_around(
        &self,
        center: GeoPoint,
        keywords: &str,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError>;
}
