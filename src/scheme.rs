//! Reserved WhatsApp URL scheme: the install probe and the `send` deep link.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

use crate::error::{Error, Result};
use crate::models::{TargetCategory, TargetDescriptor};

/// Base deep-link endpoint of the messaging app.
pub const SEND_URL: &str = "whatsapp://send";

/// Fixed probe URL used by `installed`. The query payload is inert; the URL
/// is never actually opened during the probe.
pub const PROBE_URL: &str = "whatsapp://send?text=installed";

/// Activity-type identifier of the WhatsApp share extension, reused as the
/// id of the synthetic chooser entry.
pub const TARGET_ID: &str = "net.whatsapp.WhatsApp.ShareExtension";

/// Parse the constant probe URL.
///
/// The constant is well-formed, so a parse failure here is a defect, not a
/// runtime condition; it is still propagated as a structured error rather
/// than panicking in library code.
pub fn probe_url() -> Result<Url> {
    Url::parse(PROBE_URL).map_err(|e| Error::ProbeConstruction(e.to_string()))
}

/// Build the deep link opened when the synthetic target is selected:
/// `whatsapp://send?text=<percent-encoded>` with resolved text, or the bare
/// `whatsapp://send` when no text is staged.
pub fn send_url(text: Option<&str>) -> Result<Url> {
    let raw = match text {
        Some(text) => format!(
            "{SEND_URL}?text={}",
            utf8_percent_encode(text, NON_ALPHANUMERIC)
        ),
        None => SEND_URL.to_owned(),
    };
    Url::parse(&raw).map_err(|e| Error::DeepLinkConstruction(e.to_string()))
}

/// The synthetic chooser entry standing in for WhatsApp. Not backed by a
/// platform-registered extension; the dispatcher intercepts its selection
/// and opens the deep link instead of performing a generic hand-off.
pub fn synthetic_target() -> TargetDescriptor {
    TargetDescriptor {
        id: TARGET_ID.to_owned(),
        display_name: "WhatsApp".to_owned(),
        icon: Some("whatsapp".to_owned()),
        category: TargetCategory::Share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;

    fn query_text(url: &Url) -> Option<String> {
        let query = url.query()?;
        let encoded = query.strip_prefix("text=")?;
        Some(
            percent_decode_str(encoded)
                .decode_utf8()
                .unwrap()
                .into_owned(),
        )
    }

    #[test]
    fn probe_url_is_well_formed() {
        let url = probe_url().unwrap();
        assert_eq!(url.scheme(), "whatsapp");
        assert_eq!(url.as_str(), PROBE_URL);
    }

    #[test]
    fn send_url_without_text_is_bare() {
        let url = send_url(None).unwrap();
        assert_eq!(url.as_str(), SEND_URL);
        assert!(url.query().is_none());
    }

    #[test]
    fn send_url_encodes_spaces() {
        let url = send_url(Some("hello world")).unwrap();
        assert_eq!(url.as_str(), "whatsapp://send?text=hello%20world");
    }

    #[test]
    fn encoding_round_trips_reserved_characters() {
        for text in ["a&b=c", "50% off & more", "tschüß ☕", "?text=trick", "a+b"] {
            let url = send_url(Some(text)).unwrap();
            assert_eq!(query_text(&url).as_deref(), Some(text), "text: {text}");
        }
    }

    #[test]
    fn synthetic_target_is_not_excluded() {
        assert!(!crate::exclusions::ExclusionSet::contains(TARGET_ID));
    }
}
