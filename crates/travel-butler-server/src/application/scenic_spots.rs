//! Scenic spot lookup over the POI service

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use travel_butler::{Poi, PoiSearchService, ToolEnvelope, ToolSpec};

use super::tools::{lenient_int, parse_args, AgentTool, ToolContext};

const SOURCE: &str = "amap";
const SCENIC_KEYWORDS: &str = "景点 景区 名胜 古迹";
/// Amap type code for tourist attractions
const SCENIC_TYPES: &str = "110000";
pub const DEFAULT_LIMIT: i64 = 10;

/// Finds popular scenic spots in a city
#[derive(Clone)]
pub struct ScenicSpotFinder {
    poi: Option<Arc<dyn PoiSearchService>>,
}

impl ScenicSpotFinder {
    /// `None` when no POI key is configured; every search then fails softly
    pub fn new(poi: Option<Arc<dyn PoiSearchService>>) -> Self {
        Self { poi }
    }

    pub async fn search(&self, city: &str, limit: i64) -> ToolEnvelope {
        let city = city.trim();
        if city.is_empty() {
            return ToolEnvelope::failure(SOURCE, "city 不能为空");
        }
        let Some(poi) = &self.poi else {
            return ToolEnvelope::failure(SOURCE, "未配置 AMAP_API_KEY 环境变量");
        };
        let limit = limit.clamp(1, 20);

        match poi
            .search_text(SCENIC_KEYWORDS, Some(city), Some(SCENIC_TYPES), limit as usize)
            .await
        {
            Ok(pois) => {
                let spots: Vec<Value> = pois.iter().map(spot_json).collect();
                ToolEnvelope::success(
                    SOURCE,
                    json!({
                        "city": city,
                        "limit": limit,
                        "count": spots.len(),
                        "spots": spots,
                    }),
                )
            }
            Err(e) => ToolEnvelope::failure(SOURCE, e.to_string()),
        }
    }
}

fn spot_json(poi: &Poi) -> Value {
    json!({
        "name": poi.name,
        "address": poi.address.clone().unwrap_or_default(),
        "adname": poi.district.clone().unwrap_or_default(),
        "tel": poi.tel.clone().unwrap_or_default(),
        "rating": poi.rating,
        "type": poi.category.clone().unwrap_or_default(),
        "location": poi.location.map(|p| p.to_lon_lat()).unwrap_or_default(),
    })
}

/// Numbered list for itinerary prompts: `1) 名称（区域）- 类型`
pub fn format_spots(envelope: &ToolEnvelope) -> String {
    let spots = envelope
        .data
        .as_ref()
        .and_then(|d| d.get("spots"))
        .and_then(Value::as_array)
        .filter(|s| envelope.ok && !s.is_empty());

    let Some(spots) = spots else {
        return format!(
            "景点获取失败：{}，将为你推荐经典行程",
            envelope.error.as_deref().unwrap_or("未知原因")
        );
    };

    spots
        .iter()
        .enumerate()
        .map(|(i, spot)| {
            let name = non_empty(spot.get("name")).unwrap_or("未知景点");
            let area = non_empty(spot.get("adname")).unwrap_or("未知区域");
            let kind = non_empty(spot.get("type"))
                .unwrap_or("旅游景点")
                .split(';')
                .next()
                .unwrap_or("旅游景点");
            format!("{}) {}（{}）- {}", i + 1, name, area, kind)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct SpotArgs {
    #[serde(default)]
    city: String,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

/// `search_hot_scenic_spots`
pub struct ScenicSpotsTool {
    finder: ScenicSpotFinder,
}

impl ScenicSpotsTool {
    pub fn new(finder: ScenicSpotFinder) -> Self {
        Self { finder }
    }
}

#[async_trait]
impl AgentTool for ScenicSpotsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_hot_scenic_spots".into(),
            description: "使用高德 POI 文本搜索，获取指定城市的热门景点列表。".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "城市名称（如“北京”“成都”）"},
                    "limit": {"type": "integer", "description": "返回数量（1-20）", "default": DEFAULT_LIMIT}
                },
                "required": ["city"]
            }),
        }
    }

    async fn call(&self, args: Value, _ctx: &ToolContext) -> ToolEnvelope {
        let args: SpotArgs = match parse_args(SOURCE, args) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        self.finder
            .search(&args.city, args.limit.unwrap_or(DEFAULT_LIMIT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{poi, FakePoi};
    use std::sync::Mutex;

    fn finder() -> ScenicSpotFinder {
        ScenicSpotFinder::new(Some(Arc::new(FakePoi {
            center: None,
            pois: vec![
                poi("武侯祠", "风景名胜;风景名胜;纪念馆", 30.646, 104.048),
                poi("宽窄巷子", "风景名胜;风景名胜相关;旅游景点", 30.669, 104.056),
            ],
            around_calls: Mutex::new(0),
        })))
    }

    #[tokio::test]
    async fn test_search_shapes_spots() {
        let env = finder().search(" 成都 ", 50).await;
        assert!(env.ok);
        let data = env.data.clone().unwrap();
        assert_eq!(data["city"], "成都");
        assert_eq!(data["limit"], 20);
        assert_eq!(data["count"], 2);
        assert_eq!(data["spots"][0]["adname"], "锦江区");
        assert_eq!(data["spots"][0]["location"], "104.048000,30.646000");

        let text = format_spots(&env);
        assert_eq!(
            text,
            "1) 武侯祠（锦江区）- 风景名胜\n2) 宽窄巷子（锦江区）- 风景名胜"
        );
    }

    #[tokio::test]
    async fn test_search_errors() {
        let env = finder().search("  ", 5).await;
        assert_eq!(env.error.as_deref(), Some("city 不能为空"));

        let env = ScenicSpotFinder::new(None).search("成都", 5).await;
        assert!(!env.ok);
        assert!(env.error.unwrap().contains("AMAP_API_KEY"));
        let env = ScenicSpotFinder::new(None).search("成都", 5).await;
        assert!(format_spots(&env).starts_with("景点获取失败：未配置 AMAP_API_KEY"));
    }
}
