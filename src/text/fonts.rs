use std::collections::BTreeMap;
use std::path::Path;

use crate::foundation::error::{StrataError, StrataResult};
use crate::text::style::TextStyle;

/// Fonts available to the text rasterizer, keyed by family name.
///
/// Fonts are registered from bytes, never discovered from the system, so the same inputs render
/// the same pixels on every machine. Unknown and generic family names resolve to the default
/// family (the first one registered unless set explicitly).
pub struct FontLibrary {
    font_ctx: parley::FontContext,
    families: BTreeMap<String, String>,
    default_family: Option<String>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("families", &self.families.values().collect::<Vec<_>>())
            .field("default_family", &self.default_family)
            .finish()
    }
}

impl FontLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            families: BTreeMap::new(),
            default_family: None,
        }
    }

    /// Register a font file (TTF/OTF/TTC) and return its primary family name.
    pub fn register_font_bytes(&mut self, bytes: Vec<u8>) -> StrataResult<String> {
        let registered = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let mut primary = None;
        for (family_id, _) in registered {
            let Some(name) = self.font_ctx.collection.family_name(family_id) else {
                continue;
            };
            let name = name.to_string();
            self.families.insert(name.to_lowercase(), name.clone());
            primary.get_or_insert(name);
        }
        let primary = primary.ok_or_else(|| {
            StrataError::rasterization("no font families registered from font bytes")
        })?;
        if self.default_family.is_none() {
            self.default_family = Some(primary.clone());
        }
        tracing::debug!(family = %primary, "font registered");
        Ok(primary)
    }

    /// Register every `.ttf`, `.otf` and `.ttc` file directly inside `dir`. Unreadable files are
    /// skipped. Returns the number of files registered.
    pub fn register_dir(&mut self, dir: &Path) -> usize {
        let Ok(rd) = std::fs::read_dir(dir) else {
            return 0;
        };

        let mut paths: Vec<_> = rd.flatten().map(|e| e.path()).collect();
        paths.sort();
        let mut count = 0;
        for path in paths {
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            if ext != "ttf" && ext != "otf" && ext != "ttc" {
                continue;
            }
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            if self.register_font_bytes(bytes).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Make `family` the fallback for unknown names.
    pub fn set_default_family(&mut self, family: &str) -> StrataResult<()> {
        let canonical = self
            .families
            .get(&family.to_lowercase())
            .cloned()
            .ok_or_else(|| {
                StrataError::validation(format!("font family '{family}' is not registered"))
            })?;
        self.default_family = Some(canonical);
        Ok(())
    }

    /// Registered family names.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.values().map(String::as_str)
    }

    /// Return `true` when no font has been registered.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Map a requested family name onto a registered one.
    pub fn resolve_family(&self, requested: &str) -> StrataResult<String> {
        if let Some(found) = self.families.get(&requested.trim().to_lowercase()) {
            return Ok(found.clone());
        }
        let fallback = self
            .default_family
            .clone()
            .ok_or_else(|| StrataError::rasterization("font library has no fonts"))?;
        tracing::debug!(
            requested,
            fallback = %fallback,
            "font family not registered; using fallback"
        );
        Ok(fallback)
    }

    /// Resolve every family `style` depends on, so layout never starts with a missing face.
    pub fn settle(&self, style: &TextStyle) -> StrataResult<String> {
        self.resolve_family(&style.font_family)
    }

    pub(crate) fn ctx_mut(&mut self) -> &mut parley::FontContext {
        &mut self.font_ctx
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/fonts.rs"]
mod tests;
