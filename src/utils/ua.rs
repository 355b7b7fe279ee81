//! User agent classification.
//!
//! Substring heuristics, deliberately approximate: session device data
//! feeds reports for humans, not billing. Unrecognized strings fall back
//! to desktop/Unknown rather than failing the click.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceType {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

/// Classification result for one user agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UaProfile {
    pub device_type: DeviceType,
    pub browser: &'static str,
    pub os: &'static str,
}

impl Default for UaProfile {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Desktop,
            browser: "Unknown",
            os: "Unknown",
        }
    }
}

/// Classifies a user agent into device type, browser and OS.
pub fn classify(user_agent: Option<&str>) -> UaProfile {
    let Some(raw) = user_agent else {
        return UaProfile::default();
    };
    let ua = raw.to_lowercase();
    if ua.is_empty() {
        return UaProfile::default();
    }

    UaProfile {
        device_type: classify_device(&ua),
        browser: classify_browser(&ua),
        os: classify_os(&ua),
    }
}

/// Tablet checks run first: iPad UAs contain "mobile" and Android
/// tablets are the Android UAs WITHOUT it.
fn classify_device(ua: &str) -> DeviceType {
    if ua.contains("ipad") || ua.contains("tablet") {
        return DeviceType::Tablet;
    }
    if ua.contains("android") && !ua.contains("mobile") {
        return DeviceType::Tablet;
    }
    if ua.contains("iphone")
        || ua.contains("ipod")
        || ua.contains("android")
        || ua.contains("windows phone")
        || ua.contains("mobile")
    {
        return DeviceType::Mobile;
    }
    DeviceType::Desktop
}

/// Order matters: Edge and Opera embed "chrome", Chrome embeds "safari".
fn classify_browser(ua: &str) -> &'static str {
    if ua.contains("edg") {
        "Edge"
    } else if ua.contains("opr/") || ua.contains("opera") {
        "Opera"
    } else if ua.contains("firefox") || ua.contains("fxios") {
        "Firefox"
    } else if ua.contains("chrome") || ua.contains("crios") {
        "Chrome"
    } else if ua.contains("safari") {
        "Safari"
    } else if ua.contains("msie") || ua.contains("trident") {
        "IE"
    } else {
        "Unknown"
    }
}

/// Android before Linux (Android UAs contain "linux"), iOS before Mac
/// (iPad UAs contain "like mac os x").
fn classify_os(ua: &str) -> &'static str {
    if ua.contains("windows") {
        "Windows"
    } else if ua.contains("android") {
        "Android"
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        "iOS"
    } else if ua.contains("mac os x") || ua.contains("macintosh") {
        "macOS"
    } else if ua.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    }
}
