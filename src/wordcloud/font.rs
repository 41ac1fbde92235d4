// Font lookup — find a font file that can draw Japanese.
//
// Order: the configured path, then a fixed list of well-known locations,
// then a scan of the system font directories for files whose name suggests
// CJK coverage.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Well-known font locations, most preferred first.
pub const FONT_CANDIDATES: &[&str] = &[
    "/penetration/fonts/MPLUSRounded1c-Medium.ttf",
    "/usr/share/fonts/truetype/fonts-japanese-gothic.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/ipafont-gothic/ipag.ttf",
    "/usr/share/fonts/truetype/vlgothic/VL-Gothic-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
];

/// Case-insensitive file-name fragments of CJK-capable families.
const NAME_HINTS: &[&str] = &["gothic", "mincho", "noto", "ipa"];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

#[derive(Debug, Clone)]
pub struct FontLocator {
    configured: Option<PathBuf>,
    candidates: Vec<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl FontLocator {
    /// Locator over the built-in candidates and system font directories.
    pub fn new(configured: Option<PathBuf>) -> Self {
        let mut search_dirs = vec![
            PathBuf::from("/usr/share/fonts"),
            PathBuf::from("/usr/local/share/fonts"),
        ];
        if let Some(user_fonts) = dirs::font_dir() {
            search_dirs.push(user_fonts);
        }

        Self {
            configured,
            candidates: FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
            search_dirs,
        }
    }

    /// Locator with explicit candidate files and search directories.
    pub fn with_paths(
        configured: Option<PathBuf>,
        candidates: Vec<PathBuf>,
        search_dirs: Vec<PathBuf>,
    ) -> Self {
        Self {
            configured,
            candidates,
            search_dirs,
        }
    }

    /// First usable font path, or `None`.
    pub fn locate(&self) -> Option<PathBuf> {
        self.configured
            .iter()
            .chain(self.candidates.iter())
            .find(|p| p.is_file())
            .cloned()
            .or_else(|| self.scan())
    }

    fn scan(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .filter(|d| d.is_dir())
            .flat_map(|dir| {
                WalkDir::new(dir)
                    .follow_links(true)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .find(|path| looks_like_cjk_font(path))
    }
}

/// Font file with a CJK family hint in its name.
fn looks_like_cjk_font(path: &Path) -> bool {
    let has_font_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !has_font_ext {
        return false;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    NAME_HINTS.iter().any(|hint| name.contains(hint))
}
