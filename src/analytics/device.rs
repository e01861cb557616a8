//! Device classification from user-agent-like metadata strings
//!
//! Uses woothee to map a raw user-agent string onto a small set of
//! device-class buckets. Anything woothee cannot parse falls into the
//! "unknown" bucket; classification must never fail.

use woothee::parser::Parser;

use super::UNKNOWN_BUCKET;

/// woothee categories collapsed to reporting buckets
pub fn classify_device(user_agent: &str) -> &'static str {
    if user_agent.trim().is_empty() {
        return UNKNOWN_BUCKET;
    }

    let parser = Parser::new();
    match parser.parse(user_agent) {
        Some(result) => match result.category {
            "smartphone" | "mobilephone" => "mobile",
            "pc" => "desktop",
            "crawler" => "bot",
            "appliance" | "smarttv" => "other",
            // woothee 没有独立的 tablet 类目，按字符串启发式补一层
            _ => {
                if user_agent.to_lowercase().contains("tablet")
                    || user_agent.contains("iPad")
                {
                    "tablet"
                } else {
                    UNKNOWN_BUCKET
                }
            }
        },
        None => {
            let lowered = user_agent.to_lowercase();
            if lowered.contains("tablet") || user_agent.contains("iPad") {
                "tablet"
            } else if lowered.contains("mobile") {
                "mobile"
            } else {
                UNKNOWN_BUCKET
            }
        }
    }
}
