//! Styled text: style records, inline markup, fonts and rasterization.

/// Font registration and family lookup.
pub mod fonts;
/// Inline rich-text markup.
pub mod markup;
/// Measuring and capturing text bitmaps.
pub mod raster;
/// Text style records.
pub mod style;
