//! # Media Classification Module
//!
//! Questo modulo trasforma un file media locale in un asset classificato.
//!
//! ## Responsabilità:
//! - `classify()`: funzione pura (dimensioni, kind, path) → `ScreenSize`
//! - Rilevamento del contesto companion (cartella `iMessage`)
//! - `DimensionProbe`: capability esterna per leggere le dimensioni in pixel
//! - `MediaProbe`: implementazione con `image` (screenshot) e `ffprobe` (preview)
//! - `LocalAsset`: file + lingua + kind + screen size calcolata una sola volta
//!
//! ## Contesto companion:
//! Gli screenshot iMessage hanno le stesse risoluzioni degli screenshot app,
//! quindi la variante della tabella si sceglie guardando il nome della
//! cartella due livelli sopra il file: `<root>/iMessage/<locale>/<file>`.
//!
//! ## Esempio:
//! ```ignore
//! let asset = LocalAsset::new(path, "en-US", AssetKind::Screenshot, &MediaProbe)?;
//! assert!(asset.is_valid(&MediaProbe));
//! ```

use crate::device::{self, AssetKind, ScreenSize};
use crate::error::SyncError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error};

/// Nome della cartella che seleziona la tabella companion
pub const COMPANION_DIR_NAME: &str = "iMessage";

/// Reads pixel dimensions of a media file
pub trait DimensionProbe: Send + Sync {
    fn dimensions(&self, path: &Path, kind: AssetKind) -> Result<(u32, u32), SyncError>;
}

/// Default probe: image headers for screenshots, ffprobe for previews
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaProbe;

impl DimensionProbe for MediaProbe {
    fn dimensions(&self, path: &Path, kind: AssetKind) -> Result<(u32, u32), SyncError> {
        let dimensions = match kind {
            AssetKind::Screenshot => image::image_dimensions(path).map_err(|e| SyncError::Probe {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            AssetKind::Preview => Self::probe_video(path)?,
        };
        debug!("Got dimensions {}x{} for {}", dimensions.0, dimensions.1, path.display());
        Ok(dimensions)
    }
}

impl MediaProbe {
    /// Legge larghezza e altezza del primo stream video con ffprobe
    fn probe_video(path: &Path) -> Result<(u32, u32), SyncError> {
        let output = Command::new("ffprobe")
            .args([
                "-v", "error",
                "-select_streams", "v:0",
                "-show_entries", "stream=width,height",
                "-of", "csv=s=x:p=0",
            ])
            .arg(path)
            .output()
            .map_err(|e| SyncError::Probe {
                path: path.to_path_buf(),
                reason: format!("Failed to execute ffprobe: {}", e),
            })?;

        if !output.status.success() {
            return Err(SyncError::Probe {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_ffprobe_size(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| SyncError::Probe {
            path: path.to_path_buf(),
            reason: "ffprobe returned no video stream size".to_string(),
        })
    }
}

/// Parse `WIDTHxHEIGHT` as printed by `ffprobe -of csv=s=x:p=0`
pub(crate) fn parse_ffprobe_size(output: &str) -> Option<(u32, u32)> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let (width, height) = line.split_once('x')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// True when the file lives under `<...>/iMessage/<locale>/<file>`
pub fn is_companion_path(path: &Path) -> bool {
    path.iter().rev().nth(2) == Some(OsStr::new(COMPANION_DIR_NAME))
}

/// Classifica una risoluzione nel bucket canonico. Nessun I/O.
pub fn classify(dimensions: (u32, u32), kind: AssetKind, path: &Path) -> Result<ScreenSize, SyncError> {
    let companion = is_companion_path(path);
    let size = device::lookup(kind, companion, dimensions).ok_or_else(|| {
        SyncError::UnsupportedResolution {
            path: path.to_path_buf(),
            width: dimensions.0,
            height: dimensions.1,
        }
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(device::resolve_hint(kind, size, &file_name))
}

/// Probe + classify
pub fn classify_file(
    path: &Path,
    kind: AssetKind,
    probe: &dyn DimensionProbe,
) -> Result<ScreenSize, SyncError> {
    let known_extension = path
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            kind.allowed_extensions().iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false);
    if !known_extension {
        return Err(SyncError::UnsupportedFormat(path.display().to_string()));
    }

    let dimensions = probe.dimensions(path, kind)?;
    classify(dimensions, kind, path)
}

/// One local screenshot or preview for a specific locale and device type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    pub path: PathBuf,
    pub language: String,
    pub kind: AssetKind,
    pub screen_size: ScreenSize,
}

impl LocalAsset {
    /// Crea l'asset calcolando la screen size dal file.
    ///
    /// Se l'asset non supera `is_valid` viene solo loggato un errore.
    pub fn new(
        path: impl Into<PathBuf>,
        language: impl Into<String>,
        kind: AssetKind,
        probe: &dyn DimensionProbe,
    ) -> Result<Self, SyncError> {
        let path = path.into();
        let screen_size = classify_file(&path, kind, probe)?;
        let asset = Self::with_screen_size(path, language, kind, screen_size);

        if !asset.is_valid(probe) {
            error!(
                "Looks like the {} given ({}) does not match the requirements of {}",
                kind,
                asset.path.display(),
                screen_size
            );
        }

        Ok(asset)
    }

    /// Asset con screen size già nota
    pub fn with_screen_size(
        path: impl Into<PathBuf>,
        language: impl Into<String>,
        kind: AssetKind,
        screen_size: ScreenSize,
    ) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            kind,
            screen_size,
        }
    }

    /// Validates extension and re-runs classification
    pub fn is_valid(&self, probe: &dyn DimensionProbe) -> bool {
        let extension_ok = self
            .path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                self.kind.allowed_extensions().iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false);
        if !extension_ok {
            return false;
        }

        classify_file(&self.path, self.kind, probe)
            .map(|size| size == self.screen_size)
            .unwrap_or(false)
    }

    /// Chiave del device set remoto
    pub fn display_type(&self) -> Option<&'static str> {
        self.screen_size.display_type(self.kind)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Probe that reports the same size for every file
#[cfg(test)]
pub(crate) struct FixedProbe(pub (u32, u32));

#[cfg(test)]
impl DimensionProbe for FixedProbe {
    fn dimensions(&self, _path: &Path, _kind: AssetKind) -> Result<(u32, u32), SyncError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_classify_is_total_over_tables() {
        for kind in [AssetKind::Screenshot, AssetKind::Preview] {
            for (size, pair) in device::accepted_resolutions(kind, false) {
                let path = Path::new("shots/en-US/home.png");
                assert_eq!(classify(pair, kind, path).unwrap(), size);
                assert_eq!(classify(pair, kind, path).unwrap(), size);
            }
        }
        for (size, pair) in device::accepted_resolutions(AssetKind::Screenshot, true) {
            let path = Path::new("shots/iMessage/en-US/home.png");
            assert_eq!(classify(pair, AssetKind::Screenshot, path).unwrap(), size);
        }
    }

    #[test]
    fn test_classify_rejects_everything_else() {
        let accepted: HashSet<(u32, u32)> = device::accepted_resolutions(AssetKind::Screenshot, false)
            .map(|(_, pair)| pair)
            .collect();
        let path = Path::new("shots/en-US/home.png");

        for width in (0..3000).step_by(37) {
            for height in (0..3000).step_by(41) {
                let result = classify((width, height), AssetKind::Screenshot, path);
                assert_eq!(result.is_ok(), accepted.contains(&(width, height)));
            }
        }

        match classify((100, 200), AssetKind::Preview, path) {
            Err(SyncError::UnsupportedResolution { width, height, .. }) => {
                assert_eq!((width, height), (100, 200));
            }
            other => panic!("expected UnsupportedResolution, got {:?}", other),
        }
    }

    #[test]
    fn test_companion_detection() {
        assert!(is_companion_path(Path::new("/tmp/shots/iMessage/en-US/a.png")));
        assert!(is_companion_path(Path::new("iMessage/de-DE/a.png")));
        assert!(!is_companion_path(Path::new("/tmp/shots/en-US/a.png")));
        assert!(!is_companion_path(Path::new("/tmp/iMessage/shots/en-US/a.png")));
        assert!(!is_companion_path(Path::new("en-US/a.png")));
        assert!(!is_companion_path(Path::new("a.png")));

        let size = classify((1242, 2208), AssetKind::Screenshot, Path::new("s/iMessage/fr-FR/x.png"));
        assert_eq!(size.unwrap(), ScreenSize::Ios55Messages);
    }

    #[test]
    fn test_classify_applies_filename_hints() {
        let path = Path::new("s/en-US/iPad Pro (12.9-inch) (4th generation)-home.png");
        assert_eq!(
            classify((2048, 2732), AssetKind::Screenshot, path).unwrap(),
            ScreenSize::IosIpadPro129
        );
        let path = Path::new("s/iMessage/en-US/ipadPro129-home.png");
        assert_eq!(
            classify((2732, 2048), AssetKind::Screenshot, path).unwrap(),
            ScreenSize::IosIpadPro129Messages
        );
    }

    #[test]
    fn test_local_asset_is_valid() {
        let probe = FixedProbe((750, 1334));
        let asset = LocalAsset::new("s/en-US/01_shot.png", "en-US", AssetKind::Screenshot, &probe).unwrap();
        assert_eq!(asset.screen_size, ScreenSize::Ios47);
        assert_eq!(asset.display_type(), Some("APP_IPHONE_47"));
        assert!(asset.is_valid(&probe));
        // re-classification is stable
        assert!(asset.is_valid(&probe));

        // a different probed size invalidates the stored size
        assert!(!asset.is_valid(&FixedProbe((1242, 2208))));
    }

    #[test]
    fn test_extension_allow_list() {
        let probe = FixedProbe((750, 1334));
        let preview_as_png =
            LocalAsset::with_screen_size("s/en-US/a.png", "en-US", AssetKind::Preview, ScreenSize::Ios47);
        assert!(!preview_as_png.is_valid(&probe));

        let upper_case_mov =
            LocalAsset::with_screen_size("s/en-US/a.MOV", "en-US", AssetKind::Preview, ScreenSize::Ios47);
        assert!(!upper_case_mov.is_valid(&probe));

        let preview =
            LocalAsset::with_screen_size("s/en-US/a.m4v", "en-US", AssetKind::Preview, ScreenSize::Ios47);
        assert!(preview.is_valid(&probe));
    }

    #[test]
    fn test_media_probe_reads_png_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shot.png");
        image::RgbImage::new(640, 1136).save(&path).unwrap();

        let dims = MediaProbe.dimensions(&path, AssetKind::Screenshot).unwrap();
        assert_eq!(dims, (640, 1136));

        let asset = LocalAsset::new(&path, "en-US", AssetKind::Screenshot, &MediaProbe).unwrap();
        assert_eq!(asset.screen_size, ScreenSize::Ios40);
    }

    #[test]
    fn test_media_probe_missing_file() {
        let result = MediaProbe.dimensions(Path::new("/nonexistent/shot.png"), AssetKind::Screenshot);
        assert!(matches!(result, Err(SyncError::Probe { .. })));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let probe = FixedProbe((750, 1334));
        let result = classify_file(Path::new("s/en-US/01_shot.gif"), AssetKind::Screenshot, &probe);
        assert!(matches!(result, Err(SyncError::UnsupportedFormat(_))));
        assert!(classify_file(Path::new("s/en-US/intro.MOV"), AssetKind::Preview, &probe).is_ok());
    }

    #[test]
    fn test_parse_ffprobe_size() {
        assert_eq!(parse_ffprobe_size("886x1920\n"), Some((886, 1920)));
        assert_eq!(parse_ffprobe_size("\n 1080x1920 \n"), Some((1080, 1920)));
        assert_eq!(parse_ffprobe_size("garbage"), None);
        assert_eq!(parse_ffprobe_size(""), None);
    }
}
