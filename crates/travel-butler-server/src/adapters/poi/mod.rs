//! POI adapters

mod amap;

pub use amap::AmapPoiSearch;
