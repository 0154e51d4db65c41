//! Aggregation of raw click events for reporting.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::models::click::ClickEvent;

/// Browser family guessed from a `User-Agent` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Browser {
    Edge,
    Chrome,
    Firefox,
    Safari,
    Other,
}

impl Browser {
    /// Order matters: Edge and Chrome agents also mention Safari, and Edge
    /// agents mention Chrome.
    pub fn classify(user_agent: &str) -> Self {
        if user_agent.contains("Edg") {
            Browser::Edge
        } else if user_agent.contains("Firefox") || user_agent.contains("FxiOS") {
            Browser::Firefox
        } else if user_agent.contains("Chrome") || user_agent.contains("CriOS") {
            Browser::Chrome
        } else if user_agent.contains("Safari") {
            Browser::Safari
        } else {
            Browser::Other
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Browser::Edge => "Edge",
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Other => "Other",
        };
        f.pad(name)
    }
}

/// Coarse device class guessed from a `User-Agent` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub fn classify(user_agent: &str) -> Self {
        // iPad agents also carry "Mobile".
        if user_agent.contains("Tablet") || user_agent.contains("iPad") {
            Device::Tablet
        } else if user_agent.contains("Mobile") {
            Device::Mobile
        } else {
            Device::Desktop
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Desktop => "Desktop",
            Device::Mobile => "Mobile",
            Device::Tablet => "Tablet",
        };
        f.pad(name)
    }
}

/// Totals over the clicks of one link.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClickSummary {
    pub total_clicks: usize,
    pub unique_addresses: usize,
    pub browsers: BTreeMap<Browser, usize>,
    pub devices: BTreeMap<Device, usize>,
}

impl ClickSummary {
    pub fn from_events(events: &[ClickEvent]) -> Self {
        let mut summary = ClickSummary {
            total_clicks: events.len(),
            ..Default::default()
        };

        let mut addresses = HashSet::new();
        for event in events {
            addresses.insert(event.address.as_str());
            *summary
                .browsers
                .entry(Browser::classify(&event.client_signature))
                .or_default() += 1;
            *summary
                .devices
                .entry(Device::classify(&event.client_signature))
                .or_default() += 1;
        }
        summary.unique_addresses = addresses.len();
        summary
    }

    /// Unique visitors as a rounded percentage of clicks (0 when there are none).
    pub fn unique_ratio_percent(&self) -> u32 {
        if self.total_clicks == 0 {
            return 0;
        }
        ((self.unique_addresses as f64 / self.total_clicks as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::LinkId;

    const CHROME_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    fn click(address: &str, ua: &str) -> ClickEvent {
        ClickEvent::new(LinkId::parse("abc").unwrap(), address, ua)
    }

    #[test]
    fn test_browser_classification() {
        assert_eq!(Browser::classify(CHROME_DESKTOP), Browser::Chrome);
        assert_eq!(Browser::classify(EDGE_DESKTOP), Browser::Edge);
        assert_eq!(Browser::classify(SAFARI_IPHONE), Browser::Safari);
        assert_eq!(Browser::classify(FIREFOX_LINUX), Browser::Firefox);
        assert_eq!(Browser::classify("curl/8.4.0"), Browser::Other);
    }

    #[test]
    fn test_device_classification() {
        assert_eq!(Device::classify(CHROME_DESKTOP), Device::Desktop);
        assert_eq!(Device::classify(SAFARI_IPHONE), Device::Mobile);
        assert_eq!(Device::classify(SAFARI_IPAD), Device::Tablet);
    }

    #[test]
    fn test_summary() {
        let events = vec![
            click("1.1.1.1", CHROME_DESKTOP),
            click("1.1.1.1", CHROME_DESKTOP),
            click("2.2.2.2", SAFARI_IPHONE),
            click("3.3.3.3", FIREFOX_LINUX),
        ];

        let summary = ClickSummary::from_events(&events);
        assert_eq!(summary.total_clicks, 4);
        assert_eq!(summary.unique_addresses, 3);
        assert_eq!(summary.browsers[&Browser::Chrome], 2);
        assert_eq!(summary.browsers[&Browser::Safari], 1);
        assert_eq!(summary.devices[&Device::Desktop], 3);
        assert_eq!(summary.devices[&Device::Mobile], 1);
        assert_eq!(summary.unique_ratio_percent(), 75);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ClickSummary::from_events(&[]);
        assert_eq!(summary, ClickSummary::default());
        assert_eq!(summary.unique_ratio_percent(), 0);
    }
}
