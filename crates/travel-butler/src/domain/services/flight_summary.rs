//! Flight Summary
//!
//! The flight side-process answers in Chinese prose. The figures the
//! comparison needs are scraped out of that text.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::entities::{FlightLeg, FlightSummary};

/// Characters after a block title that still belong to that block
const BLOCK_WINDOW_CHARS: usize = 450;

struct Patterns {
    duration: Regex,
    count: Regex,
    min_price: Regex,
    min_duration: Regex,
    flight_no: Regex,
    dep_time: Regex,
    arr_time: Regex,
    leg_duration: Regex,
    price: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex");
        Patterns {
            duration: re(r"(?i)(?:(\d+)h)?(?:(\d+)m)?"),
            count: re(r"查询到了\s*(\d+)\s*条"),
            min_price: re(r"最低价[:：]\s*(\d+)\s*元"),
            min_duration: re(r"最短耗时[:：]\s*([0-9hHmM ]+)"),
            flight_no: re(r"航班号[:：]\s*([A-Z0-9]+)"),
            dep_time: re(r"起飞时间[:：]\s*([0-9:\- ]{10,19})"),
            arr_time: re(r"到达时间[:：]\s*([0-9:\- ]{10,19})"),
            leg_duration: re(r"耗时[:：]\s*([0-9hHmM ]+)"),
            price: re(r"价格[:：]\s*(\d+)\s*元"),
        }
    })
}

/// `"2h15m"` → 135. Zero or unparseable durations give `None`.
pub fn duration_to_minutes(text: &str) -> Option<u32> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let caps = patterns().duration.captures(&compact)?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    let (hours, minutes) = (part(1), part(2));
    if hours == 0 && minutes == 0 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn compact_duration(raw: String) -> String {
    raw.chars().filter(|c| *c != ' ').collect::<String>()
}

fn parse_block(text: &str, title: &str) -> Option<FlightLeg> {
    let idx = text.find(title)?;
    let segment: String = text[idx..].chars().take(BLOCK_WINDOW_CHARS).collect();
    let p = patterns();

    let flight_no = capture(&p.flight_no, &segment)?;
    let duration_text = capture(&p.leg_duration, &segment)
        .map(|d| compact_duration(d.trim().to_string()))
        .filter(|d| !d.is_empty());

    Some(FlightLeg {
        flight_no,
        dep_time: capture(&p.dep_time, &segment).map(|s| s.trim().to_string()),
        arr_time: capture(&p.arr_time, &segment).map(|s| s.trim().to_string()),
        duration_minutes: duration_text.as_deref().and_then(duration_to_minutes),
        duration_text,
        price: capture(&p.price, &segment).and_then(|s| s.parse().ok()),
    })
}

/// Scrape counts, lowest price, shortest duration and the cheapest /
/// fastest highlighted flights out of the side-process' answer text.
pub fn parse_flight_summary(text: &str) -> FlightSummary {
    let p = patterns();

    let min_duration_text = capture(&p.min_duration, text)
        .map(|d| compact_duration(d.trim().to_string()))
        .filter(|d| !d.is_empty());

    FlightSummary {
        count: capture(&p.count, text).and_then(|s| s.parse().ok()),
        min_price: capture(&p.min_price, text).and_then(|s| s.parse().ok()),
        min_duration_minutes: min_duration_text.as_deref().and_then(duration_to_minutes),
        min_duration_text,
        cheapest: parse_block(text, "最低价航班为"),
        fastest: parse_block(text, "最短耗时航班为"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "为您查询到了 23 条航班信息。最低价：680元，最短耗时：2h5m。\n\
        最低价航班为：航班号：CA1234，起飞时间：2026-02-10 07:30，到达时间：2026-02-10 10:05，耗时：2h35m，价格：680元。\n\
        最短耗时航班为：航班号：MU5101，起飞时间：2026-02-10 09:00，到达时间：2026-02-10 11:05，耗时：2h 5m，价格：1020元。";

    #[test]
    fn test_duration_to_minutes() {
        assert_eq!(duration_to_minutes("2h15m"), Some(135));
        assert_eq!(duration_to_minutes("2H"), Some(120));
        assert_eq!(duration_to_minutes("45m"), Some(45));
        assert_eq!(duration_to_minutes("1h 5m"), Some(65));
        assert_eq!(duration_to_minutes("0h0m"), None);
        assert_eq!(duration_to_minutes(""), None);
        assert_eq!(duration_to_minutes("约两小时"), None);
    }

    #[test]
    fn test_parse_summary() {
        let summary = parse_flight_summary(SAMPLE);
        assert_eq!(summary.count, Some(23));
        assert_eq!(summary.min_price, Some(680));
        assert_eq!(summary.min_duration_text.as_deref(), Some("2h5m"));
        assert_eq!(summary.min_duration_minutes, Some(125));

        let cheapest = summary.cheapest.unwrap();
        assert_eq!(cheapest.flight_no, "CA1234");
        assert_eq!(cheapest.dep_time.as_deref(), Some("2026-02-10 07:30"));
        assert_eq!(cheapest.arr_time.as_deref(), Some("2026-02-10 10:05"));
        assert_eq!(cheapest.duration_minutes, Some(155));
        assert_eq!(cheapest.price, Some(680));

        let fastest = summary.fastest.unwrap();
        assert_eq!(fastest.flight_no, "MU5101");
        assert_eq!(fastest.duration_text.as_deref(), Some("2h5m"));
        assert_eq!(fastest.price, Some(1020));
    }

    #[test]
    fn test_block_without_flight_number_is_absent() {
        let summary = parse_flight_summary("最低价航班为：暂无数据");
        assert!(summary.cheapest.is_none());
        assert!(summary.fastest.is_none());
        assert_eq!(summary.count, None);
    }
}
