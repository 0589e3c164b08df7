//! The fixed set of share targets suppressed from the chooser.
//!
//! Constant for the process lifetime and not user-configurable: the chooser
//! is meant to funnel users toward WhatsApp, so built-in system actions and
//! the usual crowd of third-party share extensions are filtered out.

use crate::models::TargetDescriptor;

/// Built-in system activity types.
const SYSTEM_ACTIVITIES: &[&str] = &[
    "com.apple.UIKit.activity.PostToFacebook",
    "com.apple.UIKit.activity.PostToTwitter",
    "com.apple.UIKit.activity.PostToWeibo",
    "com.apple.UIKit.activity.Message",
    "com.apple.UIKit.activity.Mail",
    "com.apple.UIKit.activity.Print",
    "com.apple.UIKit.activity.CopyToPasteboard",
    "com.apple.UIKit.activity.AssignToContact",
    "com.apple.UIKit.activity.SaveToCameraRoll",
    "com.apple.UIKit.activity.AddToReadingList",
    "com.apple.UIKit.activity.PostToFlickr",
    "com.apple.UIKit.activity.PostToVimeo",
    "com.apple.UIKit.activity.PostToTencentWeibo",
    "com.apple.UIKit.activity.AirDrop",
];

/// Known third-party share/action extension identifiers.
const EXTENSION_ACTIVITIES: &[&str] = &[
    "com.apple.CloudDocsUI.AddToiCloudDrive",
    "com.apple.mobilenotes.SharingExtension",
    "com.apple.reminders.RemindersEditorExtension",
    "com.amazon.Lassen.SendToKindleExtension",
    "com.google.chrome.ios.ShareExtension",
    "com.google.Drive.ShareExtension",
    "com.google.Gmail.ShareExtension",
    "com.google.inbox.ShareExtension",
    "com.google.hangouts.ShareExtension",
    "com.iwilab.KakaoTalk.Share",
    "com.hammerandchisel.discord.Share",
    "com.facebook.Messenger.ShareExtension",
    "com.nhncorp.NaverSearch.ShareExtension",
    "com.linkedin.LinkedIn.ShareExtension",
    "com.tinyspeck.chatlyio.share", // Slack
    "ph.telegra.Telegraph.Share",
    "com.toyopagroup.picaboo.share", // Snapchat
    "com.fogcreek.trello.trelloshare",
    "com.riffsy.RiffsyKeyboard.RiffsyShareExtension", // GIF Keyboard by Tenor
    "com.ifttt.ifttt.share",
    "com.getdropbox.Dropbox.ActionExtension",
    "wefwef.YammerShare",
    "pinterest.ShareExtension",
    "pinterest.ActionExtension",
    "us.zoom.videomeetings.Extension",
];

/// The chooser-wide exclusion set.
pub struct ExclusionSet;

impl ExclusionSet {
    /// Whether a target identifier is suppressed from the chooser.
    pub fn contains(id: &str) -> bool {
        SYSTEM_ACTIVITIES.contains(&id) || EXTENSION_ACTIVITIES.contains(&id)
    }

    /// All excluded identifiers, passed to the native chooser as its
    /// excluded-activity-types list.
    pub fn identifiers() -> impl Iterator<Item = &'static str> {
        SYSTEM_ACTIVITIES.iter().chain(EXTENSION_ACTIVITIES).copied()
    }

    /// Drop excluded entries from a list of platform-registered targets.
    pub fn filter(targets: Vec<TargetDescriptor>) -> Vec<TargetDescriptor> {
        targets
            .into_iter()
            .filter(|t| !Self::contains(&t.id))
            .collect()
    }
}
