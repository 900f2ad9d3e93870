//! # Device Classification Tables
//!
//! Questo modulo contiene le tabelle che mappano risoluzioni in pixel ai tipi
//! di dispositivo accettati dallo store remoto.
//!
//! ## Responsabilità:
//! - Definisce `ScreenSize`, il token canonico di ogni classe di display
//! - Definisce `AssetKind` (screenshot vs preview)
//! - Una sola tabella data-driven indicizzata da (kind, companion, dimensioni)
//! - Regole ordinate di disambiguazione basate sul nome del file
//! - Mapping verso il display type remoto per ciascun kind
//!
//! ## Risoluzioni ambigue:
//! Diversi dispositivi condividono le stesse dimensioni (es. iPad Pro 12.9"
//! di 2a e 3a generazione). La tabella restituisce il bucket di default e le
//! regole di hint lo rimappano quando il nome del file contiene il nome del
//! simulatore o il token usato dai tool di download.
//!
//! Le tabelle sono un contratto esterno: devono corrispondere esattamente ai
//! display type accettati dalla piattaforma remota.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media asset handled by a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Screenshot,
    Preview,
}

impl AssetKind {
    /// Estensioni accettate dalla piattaforma remota (case-sensitive)
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Screenshot => &["png", "PNG", "jpg", "JPG", "jpeg", "JPEG"],
            Self::Preview => &["mov", "m4v", "mp4"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical device-type token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScreenSize {
    /// iPhone 4
    Ios35,
    /// iPhone 5
    Ios40,
    /// iPhone 6, 7 & 8
    Ios47,
    /// iPhone 6 Plus, 7 Plus & 8 Plus
    Ios55,
    /// iPhone XS
    Ios58,
    /// iPhone XR
    Ios61,
    /// iPhone XS Max
    Ios65,
    IosIpad,
    IosIpad105,
    IosIpad11,
    IosIpadPro,
    /// iPad Pro (12.9-inch) (3rd generation)
    IosIpadPro129,
    Ios40Messages,
    Ios47Messages,
    Ios55Messages,
    Ios58Messages,
    Ios61Messages,
    Ios65Messages,
    IosIpadMessages,
    IosIpad105Messages,
    IosIpad11Messages,
    IosIpadProMessages,
    IosIpadPro129Messages,
    IosAppleWatch,
    IosAppleWatchSeries4,
    AppleTv,
    Mac,
}

impl ScreenSize {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Ios35 => "iOS-3.5-in",
            Self::Ios40 => "iOS-4-in",
            Self::Ios47 => "iOS-4.7-in",
            Self::Ios55 => "iOS-5.5-in",
            Self::Ios58 => "iOS-5.8-in",
            Self::Ios61 => "iOS-6.1-in",
            Self::Ios65 => "iOS-6.5-in",
            Self::IosIpad => "iOS-iPad",
            Self::IosIpad105 => "iOS-iPad-10.5",
            Self::IosIpad11 => "iOS-iPad-11",
            Self::IosIpadPro => "iOS-iPad-Pro",
            Self::IosIpadPro129 => "iOS-iPad-Pro-12.9",
            Self::Ios40Messages => "iOS-4-in-messages",
            Self::Ios47Messages => "iOS-4.7-in-messages",
            Self::Ios55Messages => "iOS-5.5-in-messages",
            Self::Ios58Messages => "iOS-5.8-in-messages",
            Self::Ios61Messages => "iOS-6.1-in-messages",
            Self::Ios65Messages => "iOS-6.5-in-messages",
            Self::IosIpadMessages => "iOS-iPad-messages",
            Self::IosIpad105Messages => "iOS-iPad-10.5-messages",
            Self::IosIpad11Messages => "iOS-iPad-11-messages",
            Self::IosIpadProMessages => "iOS-iPad-Pro-messages",
            Self::IosIpadPro129Messages => "iOS-iPad-Pro-12.9-messages",
            Self::IosAppleWatch => "iOS-Apple-Watch",
            Self::IosAppleWatchSeries4 => "iOS-Apple-Watch-Series4",
            Self::AppleTv => "Apple-TV",
            Self::Mac => "Mac",
        }
    }

    /// Nice name
    pub fn formatted_name(&self) -> &'static str {
        match self {
            Self::Ios35 => "iPhone 4",
            Self::Ios40 => "iPhone 5",
            Self::Ios47 => "iPhone 6",
            Self::Ios55 => "iPhone 6 Plus",
            Self::Ios58 => "iPhone XS",
            Self::Ios61 => "iPhone XR",
            Self::Ios65 => "iPhone XS Max",
            Self::IosIpad => "iPad",
            Self::IosIpad105 => "iPad 10.5",
            Self::IosIpad11 => "iPad 11",
            Self::IosIpadPro => "iPad Pro",
            Self::IosIpadPro129 => "iPad Pro (12.9-inch) (3rd generation)",
            Self::Ios40Messages => "iPhone 5 (iMessage)",
            Self::Ios47Messages => "iPhone 6 (iMessage)",
            Self::Ios55Messages => "iPhone 6 Plus (iMessage)",
            Self::Ios58Messages => "iPhone XS (iMessage)",
            Self::Ios61Messages => "iPhone XR (iMessage)",
            Self::Ios65Messages => "iPhone XS Max (iMessage)",
            Self::IosIpadMessages => "iPad (iMessage)",
            Self::IosIpad105Messages => "iPad 10.5 (iMessage)",
            Self::IosIpad11Messages => "iPad 11 (iMessage)",
            Self::IosIpadProMessages => "iPad Pro (iMessage)",
            Self::IosIpadPro129Messages => "iPad Pro (12.9-inch) (3rd generation) (iMessage)",
            Self::IosAppleWatch => "Watch",
            Self::IosAppleWatchSeries4 => "Watch Series4",
            Self::AppleTv => "Apple TV",
            Self::Mac => "Mac",
        }
    }


    /// Display type usato dallo store remoto come chiave del device set.
    ///
    /// `None` per le classi che la piattaforma non accetta per quel kind
    /// (es. iPhone XR, o screenshot iMessage come preview).
    pub fn display_type(&self, kind: AssetKind) -> Option<&'static str> {
        match kind {
            AssetKind::Screenshot => self.screenshot_display_type(),
            AssetKind::Preview => self.preview_display_type(),
        }
    }

    fn screenshot_display_type(&self) -> Option<&'static str> {
        let display_type = match self {
            Self::Ios35 => "APP_IPHONE_35",
            Self::Ios40 => "APP_IPHONE_40",
            Self::Ios47 => "APP_IPHONE_47",
            Self::Ios55 => "APP_IPHONE_55",
            Self::Ios58 => "APP_IPHONE_58",
            Self::Ios65 => "APP_IPHONE_65",
            Self::IosIpad => "APP_IPAD_97",
            Self::IosIpad105 => "APP_IPAD_105",
            Self::IosIpad11 => "APP_IPAD_PRO_3GEN_11",
            Self::IosIpadPro => "APP_IPAD_PRO_129",
            Self::IosIpadPro129 => "APP_IPAD_PRO_3GEN_129",
            Self::Ios40Messages => "IMESSAGE_APP_IPHONE_40",
            Self::Ios47Messages => "IMESSAGE_APP_IPHONE_47",
            Self::Ios55Messages => "IMESSAGE_APP_IPHONE_55",
            Self::Ios58Messages => "IMESSAGE_APP_IPHONE_58",
            Self::Ios65Messages => "IMESSAGE_APP_IPHONE_65",
            Self::IosIpadMessages => "IMESSAGE_APP_IPAD_97",
            Self::IosIpadProMessages => "IMESSAGE_APP_IPAD_PRO_129",
            Self::IosIpadPro129Messages => "IMESSAGE_APP_IPAD_PRO_3GEN_129",
            Self::IosIpad105Messages => "IMESSAGE_APP_IPAD_105",
            Self::IosIpad11Messages => "IMESSAGE_APP_IPAD_PRO_3GEN_11",
            Self::Mac => "APP_DESKTOP",
            Self::IosAppleWatch => "APP_WATCH_SERIES_3",
            Self::IosAppleWatchSeries4 => "APP_WATCH_SERIES_4",
            Self::AppleTv => "APP_APPLE_TV",
            Self::Ios61 | Self::Ios61Messages => return None,
        };
        Some(display_type)
    }

    fn preview_display_type(&self) -> Option<&'static str> {
        let display_type = match self {
            Self::Ios35 => "IPHONE_35",
            Self::Ios40 => "IPHONE_40",
            Self::Ios47 => "IPHONE_47",
            Self::Ios55 => "IPHONE_55",
            Self::Ios58 => "IPHONE_58",
            Self::Ios65 => "IPHONE_65",
            Self::IosIpad => "IPAD_97",
            Self::IosIpad105 => "IPAD_105",
            Self::IosIpad11 => "IPAD_PRO_3GEN_11",
            Self::IosIpadPro => "IPAD_PRO_129",
            Self::IosIpadPro129 => "IPAD_PRO_3GEN_129",
            Self::Mac => "DESKTOP",
            _ => return None,
        };
        Some(display_type)
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Set of accepted resolutions for one screen size
struct Resolutions {
    size: ScreenSize,
    pairs: &'static [(u32, u32)],
}

// iPad Pro 12.9" 3rd gen shares the IOS_IPAD_PRO resolutions and is reached
// only through filename hints.
const SCREENSHOT_ENTRIES: &[Resolutions] = &[
    Resolutions { size: ScreenSize::Ios65, pairs: &[(1242, 2688), (2688, 1242)] },
    Resolutions { size: ScreenSize::Ios61, pairs: &[(828, 1792), (1792, 828)] },
    Resolutions { size: ScreenSize::Ios58, pairs: &[(1125, 2436), (2436, 1125)] },
    Resolutions { size: ScreenSize::Ios55, pairs: &[(1242, 2208), (2208, 1242)] },
    Resolutions { size: ScreenSize::Ios47, pairs: &[(750, 1334), (1334, 750)] },
    Resolutions {
        size: ScreenSize::Ios40,
        pairs: &[(640, 1096), (640, 1136), (1136, 600), (1136, 640)],
    },
    Resolutions {
        size: ScreenSize::Ios35,
        pairs: &[(640, 920), (640, 960), (960, 600), (960, 640)],
    },
    Resolutions {
        size: ScreenSize::IosIpad,
        pairs: &[
            (1024, 748),
            (1024, 768),
            (2048, 1496),
            (2048, 1536),
            (768, 1004),
            (768, 1024),
            (1536, 2008),
            (1536, 2048),
        ],
    },
    Resolutions { size: ScreenSize::IosIpad105, pairs: &[(1668, 2224), (2224, 1668)] },
    Resolutions { size: ScreenSize::IosIpad11, pairs: &[(1668, 2388), (2388, 1668)] },
    Resolutions { size: ScreenSize::IosIpadPro, pairs: &[(2732, 2048), (2048, 2732)] },
    Resolutions {
        size: ScreenSize::Mac,
        pairs: &[(1280, 800), (1440, 900), (2560, 1600), (2880, 1800)],
    },
    Resolutions { size: ScreenSize::IosAppleWatch, pairs: &[(312, 390)] },
    Resolutions { size: ScreenSize::IosAppleWatchSeries4, pairs: &[(368, 448)] },
    Resolutions { size: ScreenSize::AppleTv, pairs: &[(1920, 1080), (3840, 2160)] },
];

const MESSAGES_SCREENSHOT_ENTRIES: &[Resolutions] = &[
    Resolutions { size: ScreenSize::Ios65Messages, pairs: &[(1242, 2688), (2688, 1242)] },
    Resolutions { size: ScreenSize::Ios61Messages, pairs: &[(828, 1792), (1792, 828)] },
    Resolutions { size: ScreenSize::Ios58Messages, pairs: &[(1125, 2436), (2436, 1125)] },
    Resolutions { size: ScreenSize::Ios55Messages, pairs: &[(1242, 2208), (2208, 1242)] },
    Resolutions { size: ScreenSize::Ios47Messages, pairs: &[(750, 1334), (1334, 750)] },
    Resolutions {
        size: ScreenSize::Ios40Messages,
        pairs: &[(640, 1096), (640, 1136), (1136, 600), (1136, 640)],
    },
    Resolutions {
        size: ScreenSize::IosIpadMessages,
        pairs: &[
            (1024, 748),
            (1024, 768),
            (2048, 1496),
            (2048, 1536),
            (768, 1004),
            (768, 1024),
            (1536, 2008),
            (1536, 2048),
        ],
    },
    Resolutions { size: ScreenSize::IosIpad105Messages, pairs: &[(1668, 2224), (2224, 1668)] },
    Resolutions { size: ScreenSize::IosIpad11Messages, pairs: &[(1668, 2388), (2388, 1668)] },
    Resolutions { size: ScreenSize::IosIpadProMessages, pairs: &[(2732, 2048), (2048, 2732)] },
];

const PREVIEW_ENTRIES: &[Resolutions] = &[
    // Same as IOS_58
    Resolutions { size: ScreenSize::Ios65, pairs: &[(886, 1920), (1920, 886)] },
    // Same as IOS_40
    Resolutions { size: ScreenSize::Ios55, pairs: &[(1080, 1920), (1920, 1080)] },
    Resolutions { size: ScreenSize::Ios47, pairs: &[(750, 1334), (1334, 750)] },
    // Same as IOS_IPAD_11, IOS_IPAD_10_5, IOS_IPAD
    Resolutions {
        size: ScreenSize::IosIpadPro,
        pairs: &[
            (900, 1200),
            (1200, 900),
            (1200, 1600),
            (1600, 1200),
            (1440, 1080),
            (1080, 1440),
        ],
    },
    Resolutions {
        size: ScreenSize::Mac,
        pairs: &[(1280, 800), (1440, 900), (2560, 1600), (2880, 1800)],
    },
];

// Previews have no companion variant: both keys point at the same entries.
fn entries(kind: AssetKind, companion: bool) -> &'static [Resolutions] {
    match (kind, companion) {
        (AssetKind::Screenshot, false) => SCREENSHOT_ENTRIES,
        (AssetKind::Screenshot, true) => MESSAGES_SCREENSHOT_ENTRIES,
        (AssetKind::Preview, _) => PREVIEW_ENTRIES,
    }
}

/// Cerca il bucket di default per una risoluzione
pub fn lookup(kind: AssetKind, companion: bool, dimensions: (u32, u32)) -> Option<ScreenSize> {
    entries(kind, companion)
        .iter()
        .find(|entry| entry.pairs.contains(&dimensions))
        .map(|entry| entry.size)
}

/// Tutte le coppie (size, risoluzione) accettate da una variante della tabella
pub fn accepted_resolutions(
    kind: AssetKind,
    companion: bool,
) -> impl Iterator<Item = (ScreenSize, (u32, u32))> {
    entries(kind, companion)
        .iter()
        .flat_map(|entry| entry.pairs.iter().map(move |pair| (entry.size, *pair)))
}

/// Filename-hint rule rewriting an ambiguous bucket
struct HintRule {
    kind: AssetKind,
    from: ScreenSize,
    to: ScreenSize,
    needles: &'static [&'static str],
}

const IPAD_PRO_3GEN_SCREENSHOT_HINTS: &[&str] = &[
    // default simulator names
    "iPad Pro (12.9-inch) (3rd generation)",
    "iPad Pro (12.9-inch) (4th generation)",
    // downloaded screenshots
    "ipadPro129",
];

// Evaluated in order, first match wins.
const HINT_RULES: &[HintRule] = &[
    HintRule {
        kind: AssetKind::Screenshot,
        from: ScreenSize::IosIpadPro,
        to: ScreenSize::IosIpadPro129,
        needles: IPAD_PRO_3GEN_SCREENSHOT_HINTS,
    },
    HintRule {
        kind: AssetKind::Screenshot,
        from: ScreenSize::IosIpadProMessages,
        to: ScreenSize::IosIpadPro129Messages,
        needles: IPAD_PRO_3GEN_SCREENSHOT_HINTS,
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::Ios65,
        to: ScreenSize::Ios58,
        needles: &["iPhone Xs", "IOS_58"],
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::Ios55,
        to: ScreenSize::Ios40,
        needles: &["iPhone 5", "iPhone 5s", "IOS_40"],
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::IosIpadPro,
        to: ScreenSize::IosIpadPro129,
        needles: &[
            "iPad Pro (12.9-inch) (3rd generation)",
            "iPad Pro (12.9-inch) (4th generation)",
            "IPAD_PRO_3GEN_129",
        ],
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::IosIpadPro,
        to: ScreenSize::IosIpad11,
        needles: &["iPad Pro (11-inch) (1st generation", "IOS_IPAD_11"],
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::IosIpadPro,
        to: ScreenSize::IosIpad105,
        needles: &["iPad Pro (10.5-inch)", "IOS_IPAD_10_5"],
    },
    HintRule {
        kind: AssetKind::Preview,
        from: ScreenSize::IosIpadPro,
        to: ScreenSize::IosIpad,
        needles: &["iPad Pro (9.7-inch)", "IOS_IPAD"],
    },
];

/// Rimappa un bucket ambiguo usando gli hint nel nome del file.
///
/// Senza hint il bucket di default resta invariato.
pub fn resolve_hint(kind: AssetKind, size: ScreenSize, file_name: &str) -> ScreenSize {
    HINT_RULES
        .iter()
        .filter(|rule| rule.kind == kind && rule.from == size)
        .find(|rule| rule.needles.iter().any(|needle| file_name.contains(needle)))
        .map(|rule| rule.to)
        .unwrap_or(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_both_orientations() {
        assert_eq!(lookup(AssetKind::Screenshot, false, (750, 1334)), Some(ScreenSize::Ios47));
        assert_eq!(lookup(AssetKind::Screenshot, false, (1334, 750)), Some(ScreenSize::Ios47));
        assert_eq!(lookup(AssetKind::Preview, false, (1920, 886)), Some(ScreenSize::Ios65));
    }

    #[test]
    fn test_lookup_companion_variant() {
        assert_eq!(
            lookup(AssetKind::Screenshot, true, (750, 1334)),
            Some(ScreenSize::Ios47Messages)
        );
        // no Mac entry in the messages table
        assert_eq!(lookup(AssetKind::Screenshot, true, (1280, 800)), None);
        // previews ignore the companion context
        assert_eq!(lookup(AssetKind::Preview, true, (750, 1334)), Some(ScreenSize::Ios47));
    }

    #[test]
    fn test_lookup_unknown_resolution() {
        assert_eq!(lookup(AssetKind::Screenshot, false, (100, 100)), None);
        // 1242x2688 is a screenshot size, not a preview size
        assert_eq!(lookup(AssetKind::Preview, false, (1242, 2688)), None);
    }

    #[test]
    fn test_no_overlap_within_a_variant() {
        for (kind, companion) in [
            (AssetKind::Screenshot, false),
            (AssetKind::Screenshot, true),
            (AssetKind::Preview, false),
        ] {
            let mut seen: HashMap<(u32, u32), ScreenSize> = HashMap::new();
            for (size, pair) in accepted_resolutions(kind, companion) {
                if let Some(previous) = seen.insert(pair, size) {
                    panic!("{:?} listed for both {} and {}", pair, previous, size);
                }
            }
        }
    }

    #[test]
    fn test_screenshot_ipad_pro_hint() {
        let name = "iPad Pro (12.9-inch) (3rd generation)-01_home.png";
        assert_eq!(
            resolve_hint(AssetKind::Screenshot, ScreenSize::IosIpadPro, name),
            ScreenSize::IosIpadPro129
        );
        assert_eq!(
            resolve_hint(AssetKind::Screenshot, ScreenSize::IosIpadProMessages, "ipadPro129_2.png"),
            ScreenSize::IosIpadPro129Messages
        );
        assert_eq!(
            resolve_hint(AssetKind::Screenshot, ScreenSize::IosIpadPro, "ipad_home.png"),
            ScreenSize::IosIpadPro
        );
    }

    #[test]
    fn test_hint_only_applies_to_matching_bucket() {
        // a 4.7" screenshot never becomes an iPad even with an iPad name
        assert_eq!(
            resolve_hint(AssetKind::Screenshot, ScreenSize::Ios47, "ipadPro129.png"),
            ScreenSize::Ios47
        );
        // preview rules do not leak into screenshots
        assert_eq!(
            resolve_hint(AssetKind::Screenshot, ScreenSize::Ios65, "iPhone Xs-1.png"),
            ScreenSize::Ios65
        );
    }

    #[test]
    fn test_preview_hints_in_order() {
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::Ios65, "iPhone Xs-intro.mp4"),
            ScreenSize::Ios58
        );
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::Ios55, "0_IOS_40_0.mov"),
            ScreenSize::Ios40
        );
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::IosIpadPro, "0_IPAD_PRO_3GEN_129_0.mov"),
            ScreenSize::IosIpadPro129
        );
        // IOS_IPAD_11 wins over the shorter IOS_IPAD needle
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::IosIpadPro, "1_IOS_IPAD_11_1.mov"),
            ScreenSize::IosIpad11
        );
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::IosIpadPro, "iPad Pro (10.5-inch).mov"),
            ScreenSize::IosIpad105
        );
        assert_eq!(
            resolve_hint(AssetKind::Preview, ScreenSize::IosIpadPro, "2_IOS_IPAD_2.mov"),
            ScreenSize::IosIpad
        );
    }

    #[test]
    fn test_display_types() {
        assert_eq!(ScreenSize::Ios47.display_type(AssetKind::Screenshot), Some("APP_IPHONE_47"));
        assert_eq!(ScreenSize::Ios47.display_type(AssetKind::Preview), Some("IPHONE_47"));
        assert_eq!(ScreenSize::Ios61.display_type(AssetKind::Screenshot), None);
        assert_eq!(ScreenSize::Ios47Messages.display_type(AssetKind::Preview), None);
        assert_eq!(
            ScreenSize::IosIpad11Messages.display_type(AssetKind::Screenshot),
            Some("IMESSAGE_APP_IPAD_PRO_3GEN_11")
        );
    }
}
