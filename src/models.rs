use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Typed form of the `share` command's argument bag.
///
/// The bag arrives as loose JSON from the frontend; [`ShareRequest::from_args`]
/// validates it structurally instead of probing types at each access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShareRequest {
    /// Free-form text to share, if any.
    pub text: Option<String>,
    /// Local file path to share, if any. Existence is not checked here; the
    /// native share surface deals with missing files itself.
    pub file: Option<String>,
}

impl ShareRequest {
    /// Validate a loosely-typed argument bag into a `ShareRequest`.
    ///
    /// Anything other than a JSON object with (at most) string values for the
    /// recognized `text` and `file` keys is a caller contract violation and
    /// is rejected with [`Error::InvalidArguments`]. Unrecognized keys are
    /// ignored. An empty object is valid and yields an empty request.
    pub fn from_args(args: &serde_json::Value) -> Result<Self> {
        let map = args
            .as_object()
            .ok_or_else(|| Error::InvalidArguments(format!("{args:?}")))?;

        let field = |key: &str| -> Result<Option<String>> {
            match map.get(key) {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(Error::InvalidArguments(format!("{args:?}"))),
            }
        };

        Ok(Self {
            text: field("text")?,
            // An empty path is treated as absent rather than producing a
            // file item pointing at nothing.
            file: field("file")?.filter(|path| !path.is_empty()),
        })
    }

    /// Stage the payload items for this request: at most one text item and
    /// one file item, in that order.
    pub fn items(&self) -> Vec<ShareItem> {
        let mut items = Vec::with_capacity(2);
        if let Some(text) = &self.text {
            items.push(ShareItem::Text(text.clone()));
        }
        if let Some(path) = &self.file {
            items.push(ShareItem::File(path.clone()));
        }
        items
    }
}

/// A single payload item staged for one share invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ShareItem {
    Text(String),
    File(String),
}

impl ShareItem {
    /// Placeholder value shown in the chooser preview before a target is
    /// picked: a text item previews its text, a file item its path.
    pub fn placeholder(&self) -> &str {
        match self {
            ShareItem::Text(text) => text,
            ShareItem::File(path) => path,
        }
    }
}

/// A candidate recipient of the share: either a platform-registered
/// application/extension or the synthetic WhatsApp entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Stable activity-type identifier, e.g. `net.whatsapp.WhatsApp.ShareExtension`.
    pub id: String,
    /// Human-readable name shown in the chooser.
    pub display_name: String,
    /// Optional icon resource name, passed through opaquely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Always [`TargetCategory::Share`] in this plugin.
    pub category: TargetCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetCategory {
    Share,
}

/// Popover anchor for tablet-class presentation: a zero-size source rect
/// centered in the hosting view, with no arrow. Rendering metadata only,
/// passed opaquely to the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorHint {
    pub x: f64,
    pub y: f64,
}
