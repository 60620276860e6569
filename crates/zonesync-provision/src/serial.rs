//! Serial matching against the unprovisioned device directory
//!
//! Directory entries carry a composite identifier:
//!
//! ```text
//!   1A2B3C4D5E6F<br>(SKYW-99887766)
//!   └─── hex ──┘     └─ vendor code ┘
//!                    prefix  suffix
//! ```
//!
//! An operator-typed serial matches an entry, ignoring case, when any of
//! the following holds:
//!
//! 1. it equals the hex identifier
//! 2. it equals the vendor code
//! 3. its last 8 characters equal the vendor suffix
//! 4. its last 8 characters equal the last 8 characters of the hex identifier
//!
//! The first entry in directory order wins.

use serde::Serialize;
use zonesync_upstream::DirectoryEntry;

const TAIL_LEN: usize = 8;
const VENDOR_SEPARATOR: char = '-';

/// Parsed form of a directory entry's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// Raw hexadecimal identifier
    pub hex: String,
    /// Vendor-prefixed code, without parentheses
    pub vendor_code: Option<String>,
}

impl DeviceIdentity {
    pub fn parse(text: &str) -> Self {
        let (head, tail) = match text.split_once('(') {
            Some((head, tail)) => (head, Some(tail)),
            None => (text, None),
        };
        // ASCII lowercasing keeps byte offsets, so the index is valid in `head`
        let hex = match head.to_ascii_lowercase().find("<br") {
            Some(at) => &head[..at],
            None => head,
        }
        .trim()
        .to_string();
        let vendor_code = tail
            .and_then(|t| t.split(')').next())
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string);
        Self { hex, vendor_code }
    }

    /// Vendor code part before the separator
    pub fn vendor_prefix(&self) -> Option<&str> {
        self.vendor_code
            .as_deref()
            .and_then(|code| code.split_once(VENDOR_SEPARATOR))
            .map(|(prefix, _)| prefix)
    }

    /// Vendor code part after the separator
    pub fn vendor_suffix(&self) -> Option<&str> {
        self.vendor_code
            .as_deref()
            .and_then(|code| code.split_once(VENDOR_SEPARATOR))
            .map(|(_, suffix)| suffix)
    }

    /// Identifier sent to the backend when provisioning this device
    pub fn serial(&self) -> &str {
        if self.hex.is_empty() {
            self.vendor_code.as_deref().unwrap_or_default()
        } else {
            &self.hex
        }
    }

    fn matches(&self, input: &str) -> Option<MatchRule> {
        let input_tail = tail(input, TAIL_LEN);
        if !self.hex.is_empty() && self.hex.eq_ignore_ascii_case(input) {
            return Some(MatchRule::Hex);
        }
        if let Some(code) = &self.vendor_code {
            if code.eq_ignore_ascii_case(input) {
                return Some(MatchRule::VendorCode);
            }
        }
        if let Some(suffix) = self.vendor_suffix() {
            if !suffix.is_empty() && suffix.eq_ignore_ascii_case(input_tail) {
                return Some(MatchRule::VendorSuffix);
            }
        }
        if input_tail.chars().count() == TAIL_LEN && tail(&self.hex, TAIL_LEN).eq_ignore_ascii_case(input_tail) {
            return Some(MatchRule::HexTail);
        }
        None
    }
}

/// Which rule selected the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Hex,
    VendorCode,
    VendorSuffix,
    HexTail,
}

/// Directory entry selected for an input serial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedDevice {
    pub entry: DirectoryEntry,
    pub identity: DeviceIdentity,
    pub rule: MatchRule,
}

impl MatchedDevice {
    pub fn serial(&self) -> &str {
        self.identity.serial()
    }
}

/// Result of a directory search
#[derive(Debug, Clone, PartialEq)]
pub enum SerialMatch {
    Matched(MatchedDevice),
    /// No directory entry accepts the serial
    NotAvailable,
}

impl SerialMatch {
    pub fn matched(self) -> Option<MatchedDevice> {
        match self {
            Self::Matched(device) => Some(device),
            Self::NotAvailable => None,
        }
    }
}

/// Serial lookup over the unprovisioned device directory
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialMatcher;

impl SerialMatcher {
    pub fn match_serial(&self, directory: &[DirectoryEntry], input: &str) -> SerialMatch {
        let input = input.trim();
        if input.is_empty() {
            return SerialMatch::NotAvailable;
        }

        directory
            .iter()
            .find_map(|entry| {
                let identity = DeviceIdentity::parse(&entry.text);
                identity.matches(input).map(|rule| MatchedDevice {
                    entry: entry.clone(),
                    identity,
                    rule,
                })
            })
            .map_or(SerialMatch::NotAvailable, SerialMatch::Matched)
    }
}

fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    s.char_indices()
        .nth(count - n)
        .map_or(s, |(idx, _)| &s[idx..])
}
