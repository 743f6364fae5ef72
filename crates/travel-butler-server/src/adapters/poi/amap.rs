//! Amap (高德) web-service client for geocoding and POI search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use travel_butler::{DomainError, GeoPoint, Poi, PoiSearchService};

const BASE_URL: &str = "https://restapi.amap.com/v3";
const TIMEOUT_SECS: u64 = 12;
/// Amap caps `offset` (page size) at 25
const MAX_PAGE_SIZE: usize = 25;

/// [`PoiSearchService`] backed by the Amap REST API
#[derive(Clone)]
pub struct AmapPoiSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AmapPoiSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, DomainError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(&[("key", self.api_key.as_str()), ("output", "json")])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    DomainError::Unreachable(format!("网络请求错误: {e}"))
                } else {
                    DomainError::ExternalService(format!("网络请求错误: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::ExternalService(format!("Amap HTTP {}", status.as_u16())));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("响应解析失败: {e}")))?;

        if data.get("status").and_then(Value::as_str) != Some("1") {
            let info = data
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("未知错误");
            return Err(DomainError::ExternalService(format!("API调用失败: {info}")));
        }

        Ok(data)
    }
}

/// Amap sends `[]` instead of an empty string for missing text fields
fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => items.first().and_then(|v| text_field(Some(v))),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_poi(raw: &Value) -> Option<Poi> {
    let name = text_field(raw.get("name"))?;
    let biz_ext = raw.get("biz_ext");
    Some(Poi {
        id: text_field(raw.get("id")).unwrap_or_default(),
        name,
        address: text_field(raw.get("address")),
        district: text_field(raw.get("adname")),
        tel: text_field(raw.get("tel")),
        location: text_field(raw.get("location")).and_then(|s| GeoPoint::parse_lon_lat(&s)),
        distance_m: text_field(raw.get("distance")).and_then(|s| s.parse().ok()),
        category: text_field(raw.get("type")),
        rating: biz_ext.and_then(|b| text_field(b.get("rating"))),
    })
}

fn parse_pois(data: &Value) -> Vec<Poi> {
    data.get("pois")
        .and_then(Value::as_array)
        .map(|pois| pois.iter().filter_map(parse_poi).collect())
        .unwrap_or_default()
}

#[async_trait]
impl PoiSearchService for AmapPoiSearch {
    async fn geocode(&self, address: &str, city: Option<&str>) -> Result<Option<GeoPoint>, DomainError> {
        let mut params = vec![("address", address.to_string())];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }
        let data = self.get("geocode/geo", &params).await?;
        Ok(data
            .pointer("/geocodes/0/location")
            .and_then(Value::as_str)
            .and_then(GeoPoint::parse_lon_lat))
    }

    async fn search_text(
        &self,
        keywords: &str,
        city: Option<&str>,
        types: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError> {
        let mut params = vec![
            ("keywords", keywords.to_string()),
            ("offset", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("page", "1".to_string()),
            ("extensions", "base".to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
            params.push(("citylimit", "true".to_string()));
        }
        if let Some(types) = types {
            params.push(("types", types.to_string()));
        }
        let data = self.get("place/text", &params).await?;
        let mut pois = parse_pois(&data);
        pois.truncate(limit);
        Ok(pois)
    }

    async fn search_around(
        &self,
        center: GeoPoint,
        keywords: &str,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Poi>, DomainError> {
        let params = vec![
            ("location", center.to_lon_lat()),
            ("keywords", keywords.to_string()),
            ("radius", radius_m.to_string()),
            ("offset", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("page", "1".to_string()),
            ("extensions", "base".to_string()),
        ];
        let data = self.get("place/around", &params).await?;
        let mut pois = parse_pois(&data);
        pois.truncate(limit);
        Ok(pois)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_parse_poi_handles_empty_arrays() {
        let raw = json!({
            "id": "B000A", "name": "宽窄巷子", "address": [], "adname": "青羊区",
            "tel": [], "type": "风景名胜;风景名胜;风景名胜", "location": "104.053,30.669",
            "distance": "350", "biz_ext": {"rating": "4.7"}
        });
        let poi = parse_poi(&raw).unwrap();
        assert_eq!(poi.name, "宽窄巷子");
        assert_eq!(poi.address, None);
        assert_eq!(poi.tel, None);
        assert_eq!(poi.district.as_deref(), Some("青羊区"));
        assert_eq!(poi.distance_m, Some(350.0));
        assert_eq!(poi.rating.as_deref(), Some("4.7"));
        assert!(poi.location.is_some());
    }

    #[tokio::test]
    async fn test_search_text_and_status_errors() {
        let router = Router::new().route(
            "/place/text",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if q.get("key").map(String::as_str) != Some("good") {
                    return Json(json!({"status": "0", "info": "INVALID_USER_KEY"}));
                }
                assert_eq!(q.get("types").map(String::as_str), Some("110000"));
                Json(json!({"status": "1", "pois": [
                    {"id": "1", "name": "武侯祠", "location": "104.04,30.64"},
                    {"id": "2", "name": "杜甫草堂", "location": "104.03,30.66"}
                ]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        let base = format!("http://{addr}");

        let amap = AmapPoiSearch::new("good").with_base_url(&base);
        let pois = amap
            .search_text("景点", Some("成都"), Some("110000"), 1)
            .await
            .unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].name, "武侯祠");

        let bad = AmapPoiSearch::new("bad").with_base_url(&base);
        let err = bad
            .search_text("景点", Some("成都"), Some("110000"), 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("INVALID_USER_KEY"));
    }
}
