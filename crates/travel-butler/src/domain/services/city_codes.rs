//! City Codes
//!
//! Chinese city names to IATA city codes for flight searches.

const ALIASES: &[(&str, &str)] = &[
    ("北京市", "北京"),
    ("上海市", "上海"),
    ("广州市", "广州"),
    ("深圳市", "深圳"),
    ("西安市", "西安"),
    ("成都市", "成都"),
    ("重庆市", "重庆"),
];

const CITY_CODES: &[(&str, &str)] = &[
    ("北京", "BJS"),
    ("上海", "SHA"),
    ("广州", "CAN"),
    ("深圳", "SZX"),
    ("成都", "CTU"),
    ("重庆", "CKG"),
    ("西安", "SIA"),
    ("杭州", "HGH"),
    ("南京", "NKG"),
    ("武汉", "WUH"),
    ("长沙", "CSX"),
    ("昆明", "KMG"),
    ("贵阳", "KWE"),
    ("南宁", "NNG"),
    ("海口", "HAK"),
    ("三亚", "SYX"),
    ("厦门", "XMN"),
    ("福州", "FOC"),
    ("青岛", "TAO"),
    ("济南", "TNA"),
    ("郑州", "CGO"),
    ("天津", "TSN"),
    ("石家庄", "SJW"),
    ("太原", "TYN"),
    ("呼和浩特", "HET"),
    ("沈阳", "SHE"),
    ("大连", "DLC"),
    ("长春", "CGQ"),
    ("哈尔滨", "HRB"),
    ("合肥", "HFE"),
    ("南昌", "KHN"),
    ("宁波", "NGB"),
    ("温州", "WNZ"),
    ("无锡", "WUX"),
    ("兰州", "LHW"),
    ("西宁", "XNN"),
    ("银川", "INC"),
    ("乌鲁木齐", "URC"),
    ("拉萨", "LXA"),
    ("丽江", "LJG"),
    ("桂林", "KWL"),
    ("张家界", "DYG"),
    ("珠海", "ZUH"),
    ("香港", "HKG"),
    ("澳门", "MFM"),
    ("台北", "TPE"),
];

fn lookup(name: &str) -> Option<&'static str> {
    CITY_CODES
        .iter()
        .find(|(city, _)| *city == name)
        .map(|(_, code)| *code)
}

/// Resolve a city name (or an existing three-letter code) to its IATA
/// city code.
pub fn to_iata_city_code(name_or_code: &str) -> Option<String> {
    let s = name_or_code.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(s.to_ascii_uppercase());
    }

    let name = ALIASES
        .iter()
        .find(|(alias, _)| *alias == s)
        .map_or(s, |(_, canonical)| *canonical);

    lookup(name)
        .or_else(|| name.strip_suffix('市').and_then(lookup))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through_uppercased() {
        assert_eq!(to_iata_city_code("bjs"), Some("BJS".into()));
        assert_eq!(to_iata_city_code(" CTU "), Some("CTU".into()));
    }

    #[test]
    fn test_names_and_aliases() {
        assert_eq!(to_iata_city_code("北京"), Some("BJS".into()));
        assert_eq!(to_iata_city_code("北京市"), Some("BJS".into()));
        assert_eq!(to_iata_city_code("杭州市"), Some("HGH".into()));
        assert_eq!(to_iata_city_code("乌鲁木齐"), Some("URC".into()));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(to_iata_city_code(""), None);
        assert_eq!(to_iata_city_code("火星"), None);
        assert_eq!(to_iata_city_code("ABCD"), None);
    }
}
