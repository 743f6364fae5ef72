//! Hotel Recommendation Service
//!
//! Location → coordinates → nearby hotels → per-hotel neighbourhood
//! analysis (subway, attractions, shops, buses) → LLM ranking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use travel_butler::{
    ChatMessage, CompletionOptions, GeoPoint, LlmProvider, Poi, PoiSearchService, ToolEnvelope,
    ToolSpec,
};

use super::tools::{lenient_int, parse_args, AgentTool, ToolContext};

const SOURCE: &str = "amap+llm";
const RANK_TEMPERATURE: f32 = 0.2;
const DEFAULT_THROTTLE: Duration = Duration::from_millis(80);
/// Walking speed in metres per second
const WALK_SPEED: f64 = 1.2;
/// Sort key for places without coordinates
const UNKNOWN_DISTANCE: u32 = 999_999;
const MAX_COMPACT: usize = 20;

const ATTRACTION_TYPES: [&str; 6] = ["风景名胜", "公园广场", "博物馆", "文物古迹", "旅游景点", "景点"];

const RANK_SYSTEM_PROMPT: &str = "你是资深旅行顾问与酒店选址专家。你会收到用户画像profile与候选酒店数据。请基于profile筛选并推荐酒店。不得编造不存在的价格/设施/距离。只输出纯文本，不要输出JSON，不要输出Markdown代码块。

输出必须严格遵守以下格式（用中文）：
【推荐结论】一段话总结（1-2句）
【推荐清单】必须给出TopN={top_n}家，按1..N编号，每家包含：
  - 酒店名：xxx
  - 位置亮点：地铁/景点/商业/中心距离中至少2条（基于数据）
  - 可能的不足：1条（基于数据或信息缺失说明）
【下一步我需要确认】最多2个问题，用于推进下一步（例如：是否需要比价/到达方式/偏好住景区还是市区）

注意：如果候选里没有价格字段，不要声称“更便宜”，只能说“更可能节省通勤成本/更偏经济型位置”，并建议下一步比价。";

// ============================================================================
// Analysis Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubwayAccess {
    pub name: Option<String>,
    pub distance_m: Option<u32>,
    pub walk_min: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    pub distance_m: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Commercial {
    pub malls: Vec<NearbyPlace>,
    pub markets: Vec<NearbyPlace>,
    pub restaurants: Vec<NearbyPlace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusAccess {
    pub count_500m: usize,
    pub nearest: Option<String>,
}

/// A hotel with its neighbourhood analysis; analysis fields are absent
/// when the hotel has no coordinates
#[derive(Debug, Clone, Serialize)]
pub struct HotelCandidate {
    pub hotel_id: String,
    pub name: String,
    pub address: Option<String>,
    pub tel: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rating: Option<String>,
    pub fetched_at: String,
    pub subway: Option<SubwayAccess>,
    pub attractions: Option<Vec<NearbyPlace>>,
    pub commercial: Option<Commercial>,
    pub bus: Option<BusAccess>,
    pub distance_to_center_m: Option<u32>,
}

impl HotelCandidate {
    /// Fields handed to the ranking model
    fn compact(&self) -> Value {
        json!({
            "name": self.name,
            "address": self.address,
            "rating": self.rating,
            "distance_to_center_m": self.distance_to_center_m,
            "subway": self.subway,
            "attractions": self.attractions,
            "commercial": self.commercial,
            "bus": self.bus,
        })
    }
}

// ============================================================================
// Finder
// ============================================================================

/// Geocoding and POI lookups with per-finder caches. One finder serves one
/// request.
pub struct HotelFinder {
    poi: Arc<dyn PoiSearchService>,
    throttle: Duration,
    geo_cache: HashMap<String, GeoPoint>,
    poi_cache: HashMap<String, Vec<Poi>>,
}

impl HotelFinder {
    pub fn new(poi: Arc<dyn PoiSearchService>, throttle: Duration) -> Self {
        Self {
            poi,
            throttle,
            geo_cache: HashMap::new(),
            poi_cache: HashMap::new(),
        }
    }

    pub async fn find_hotels(&mut self, location: &str, radius: u32, max_hotels: usize) -> Vec<HotelCandidate> {
        let Some(center) = self.geocode(location).await else {
            tracing::warn!("⚠️  Geocoding failed for {}", location);
            return Vec::new();
        };

        let hotels = self.nearby(center, radius, "酒店", max_hotels).await;
        let total = hotels.len();
        let mut detailed = Vec::with_capacity(total);
        for (i, hotel) in hotels.iter().enumerate() {
            detailed.push(self.analyze(hotel, center).await);
            if i + 1 < total {
                tokio::time::sleep(self.throttle).await;
            }
        }
        detailed
    }

    async fn geocode(&mut self, location: &str) -> Option<GeoPoint> {
        let key = format!("geo:{location}");
        if let Some(point) = self.geo_cache.get(&key) {
            return Some(*point);
        }
        match self.poi.geocode(location, None).await {
            Ok(Some(point)) => {
                self.geo_cache.insert(key, point);
                Some(point)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Geocode error: {}", e);
                None
            }
        }
    }

    async fn nearby(&mut self, center: GeoPoint, radius: u32, keywords: &str, count: usize) -> Vec<Poi> {
        let key = format!(
            "poi:{:.4},{:.4},{},{},{}",
            center.lat, center.lon, radius, keywords, count
        );
        if let Some(pois) = self.poi_cache.get(&key) {
            return pois.iter().take(count).cloned().collect();
        }
        match self.poi.search_around(center, keywords, radius, count).await {
            Ok(pois) => {
                self.poi_cache.insert(key, pois.clone());
                pois.into_iter().take(count).collect()
            }
            Err(e) => {
                tracing::warn!("POI search '{}' failed: {}", keywords, e);
                Vec::new()
            }
        }
    }

    async fn analyze(&mut self, hotel: &Poi, center: GeoPoint) -> HotelCandidate {
        let mut candidate = HotelCandidate {
            hotel_id: hotel.id.clone(),
            name: hotel.name.clone(),
            address: hotel.address.clone(),
            tel: hotel.tel.clone(),
            location: hotel.location.map(|p| p.to_lon_lat()),
            kind: hotel.category.clone(),
            rating: hotel.rating.clone(),
            fetched_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            subway: None,
            attractions: None,
            commercial: None,
            bus: None,
            distance_to_center_m: None,
        };

        if let Some(at) = hotel.location {
            candidate.subway = Some(self.subway_access(at).await);
            candidate.attractions = Some(self.attractions(at).await);
            candidate.commercial = Some(self.commercial(at).await);
            candidate.bus = Some(self.bus_access(at).await);
            candidate.distance_to_center_m = Some(at.distance_to(&center) as u32);
        }
        candidate
    }

    async fn subway_access(&mut self, at: GeoPoint) -> SubwayAccess {
        let stations = self.nearby(at, 1500, "地铁站", 3).await;
        let nearest = stations
            .iter()
            .filter_map(|s| s.location.map(|loc| (s, at.distance_to(&loc))))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((station, d)) => SubwayAccess {
                name: Some(station.name.clone()),
                distance_m: Some(d as u32),
                walk_min: Some((d / WALK_SPEED / 60.0) as u32),
            },
            None => SubwayAccess::default(),
        }
    }

    async fn attractions(&mut self, at: GeoPoint) -> Vec<NearbyPlace> {
        let pois = self.nearby(at, 2000, "", 12).await;
        let mut out: Vec<NearbyPlace> = pois
            .iter()
            .filter(|p| is_attraction(p))
            .filter_map(|p| {
                let loc = p.location?;
                Some(NearbyPlace {
                    name: p.name.clone(),
                    distance_m: at.distance_to(&loc) as u32,
                    kind: Some(p.category.clone().unwrap_or_default()),
                })
            })
            .collect();
        out.sort_by_key(|p| p.distance_m);
        out.truncate(3);
        out
    }

    async fn commercial(&mut self, at: GeoPoint) -> Commercial {
        Commercial {
            malls: self.closest(at, "商场|购物中心").await,
            markets: self.closest(at, "超市|便利店").await,
            restaurants: self.closest(at, "餐厅|饭店|美食").await,
        }
    }

    async fn closest(&mut self, at: GeoPoint, keywords: &str) -> Vec<NearbyPlace> {
        let pois = self.nearby(at, 1000, keywords, 8).await;
        let mut items: Vec<NearbyPlace> = pois
            .iter()
            .map(|p| NearbyPlace {
                name: p.name.clone(),
                distance_m: p
                    .location
                    .map(|loc| at.distance_to(&loc) as u32)
                    .unwrap_or(UNKNOWN_DISTANCE),
                kind: None,
            })
            .collect();
        items.sort_by_key(|p| p.distance_m);
        items.truncate(3);
        items
    }

    async fn bus_access(&mut self, at: GeoPoint) -> BusAccess {
        let stops = self.nearby(at, 500, "公交站", 10).await;
        BusAccess {
            count_500m: stops.len(),
            nearest: stops.first().map(|s| s.name.clone()),
        }
    }
}

fn is_attraction(poi: &Poi) -> bool {
    let kind = poi.category.as_deref().unwrap_or("");
    ATTRACTION_TYPES.iter().any(|t| kind.contains(t))
        || poi.name.contains("公园")
        || poi.name.contains("景区")
}

// ============================================================================
// Service
// ============================================================================

/// Input for [`HotelService::recommend`]; numbers are clamped on use
#[derive(Debug, Clone)]
pub struct HotelRequest {
    pub location: String,
    pub profile_json: String,
    pub radius: i64,
    pub user_type: String,
    pub top_n: i64,
    pub max_hotels: i64,
}

pub struct HotelService {
    llm: Arc<dyn LlmProvider>,
    poi: Option<Arc<dyn PoiSearchService>>,
    throttle: Duration,
}

impl HotelService {
    pub fn new(llm: Arc<dyn LlmProvider>, poi: Option<Arc<dyn PoiSearchService>>) -> Self {
        Self {
            llm,
            poi,
            throttle: DEFAULT_THROTTLE,
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub async fn recommend(&self, request: HotelRequest) -> ToolEnvelope {
        let Some(poi) = &self.poi else {
            return ToolEnvelope::failure(SOURCE, "未配置 AMAP_API_KEY（环境变量或 settings）");
        };
        let location = request.location.trim();
        if location.is_empty() {
            return ToolEnvelope::failure(SOURCE, "location 不能为空");
        }

        let radius = request.radius.clamp(300, 5000);
        let top_n = request.top_n.clamp(1, 10);
        let max_hotels = request.max_hotels.clamp(5, 30);

        tracing::info!("🏨 Hotel search near {} (radius {}m)", location, radius);
        let mut finder = HotelFinder::new(poi.clone(), self.throttle);
        let hotels = finder
            .find_hotels(location, radius as u32, max_hotels as usize)
            .await;
        if hotels.is_empty() {
            return ToolEnvelope::failure(SOURCE, "未找到酒店候选（地理编码失败或周边无结果）");
        }

        let compact: Vec<Value> = hotels
            .iter()
            .take((max_hotels as usize).min(MAX_COMPACT))
            .map(HotelCandidate::compact)
            .collect();
        let text = match self
            .rank(&compact, &request.user_type, top_n, &request.profile_json)
            .await
        {
            Ok(text) => text,
            Err(e) => return ToolEnvelope::failure(SOURCE, format!("酒店推荐失败：{e}")),
        };

        ToolEnvelope::success(
            SOURCE,
            json!({
                "query": {
                    "location": location,
                    "radius": radius,
                    "user_type": request.user_type,
                    "top_n": top_n,
                },
                "text": text,
                "candidates_count": hotels.len(),
            }),
        )
    }

    async fn rank(
        &self,
        hotels: &[Value],
        user_type: &str,
        top_n: i64,
        profile_json: &str,
    ) -> Result<String, travel_butler::DomainError> {
        let profile_json = match profile_json.trim() {
            "" => "{}",
            s => s,
        };
        let system = RANK_SYSTEM_PROMPT.replace("{top_n}", &top_n.to_string());
        let user = format!(
            "用户画像profile(JSON)：{profile_json}\n用户类型：{user_type}\n需要推荐TopN：{top_n}\n候选酒店数据(JSON)：{}\n",
            Value::Array(hotels.to_vec())
        );
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];

        let response = self
            .llm
            .complete(&messages, &CompletionOptions::with_temperature(RANK_TEMPERATURE))
            .await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Ok(format!(
                "【推荐结论】已获取到附近酒店候选，但模型未返回推荐文本。\n\
                 【推荐清单】暂无法生成Top{top_n}清单。\n\
                 【下一步我需要确认】你更想住景区附近还是市区更方便？需要我帮你做平台比价吗？"
            ));
        }
        Ok(text.to_string())
    }
}

// ============================================================================
// Tool
// ============================================================================

#[derive(Debug, Deserialize)]
struct HotelArgs {
    #[serde(default)]
    location: String,
    #[serde(default)]
    profile_json: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    radius: Option<i64>,
    #[serde(default)]
    user_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    top_n: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    max_hotels: Option<i64>,
}

/// `recommend_hotels_nearby`
pub struct HotelsNearbyTool {
    service: Arc<HotelService>,
}

impl HotelsNearbyTool {
    pub fn new(service: Arc<HotelService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AgentTool for HotelsNearbyTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "recommend_hotels_nearby".into(),
            description: "在某个位置附近推荐酒店（高德实时POI + 地理分析 + 大模型总结推荐）。".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {"type": "string", "description": "地点，如“成都春熙路”"},
                    "profile_json": {"type": "string", "description": "用户画像 JSON；省略时使用当前会话画像"},
                    "radius": {"type": "integer", "default": 2000},
                    "user_type": {"type": "string", "default": "综合"},
                    "top_n": {"type": "integer", "default": 6},
                    "max_hotels": {"type": "integer", "default": 20}
                },
                "required": ["location"]
            }),
        }
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> ToolEnvelope {
        let args: HotelArgs = match parse_args(SOURCE, args) {
            Ok(args) => args,
            Err(envelope) => return envelope,
        };
        let request = HotelRequest {
            profile_json: ctx.profile_json(args.profile_json.as_deref()),
            location: args.location,
            radius: args.radius.unwrap_or(2000),
            user_type: args.user_type.unwrap_or_else(|| "综合".to_string()),
            top_n: args.top_n.unwrap_or(6),
            max_hotels: args.max_hotels.unwrap_or(20),
        };
        self.service.recommend(request).await
    }
}
