use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use strata::assets::decode::{DecodedImage, decode_any};
use strata::layers::model::{Background, LayerImage, SourceKind};
use strata::render::canvas::CanvasAssets;
use strata::text::fonts::FontLibrary;
use strata::text::raster::TextRasterOptions;
use strata::{
    CanvasOptions, ColorRgba8, ContainerSize, EditorConfig, LayerConfiguration, SessionSnapshot,
    StrataResult, TextRasterizer, TextRenderer, TextStyle, compose_canvas,
};

#[derive(Parser, Debug)]
#[command(name = "strata", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a text style record to a PNG.
    Text(TextArgs),
    /// Compose a saved session onto a canvas and write a PNG.
    Compose(ComposeArgs),
    /// Print the layer configuration a session would save, and what still blocks it.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct TextArgs {
    /// Text style JSON.
    #[arg(long)]
    style: PathBuf,

    /// Directory of .ttf/.otf/.ttc files.
    #[arg(long)]
    fonts: PathBuf,

    /// Editor config JSON (text padding and limits).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Session snapshot JSON.
    #[arg(long)]
    snapshot: PathBuf,

    /// Directory holding the background and uploaded images, by file name.
    #[arg(long)]
    assets: PathBuf,

    /// Directory of fonts used to re-capture text images.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Container width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Container height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Clear color (CSS syntax).
    #[arg(long, default_value = "transparent")]
    clear: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Session snapshot JSON.
    #[arg(long)]
    snapshot: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Text(args) => cmd_text(args),
        Command::Compose(args) => cmd_compose(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn load_fonts(dir: &Path) -> anyhow::Result<FontLibrary> {
    let mut fonts = FontLibrary::new();
    if fonts.register_dir(dir) == 0 {
        anyhow::bail!("no fonts found in '{}'", dir.display());
    }
    Ok(fonts)
}

fn write_png(out: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, png).with_context(|| format!("write png '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_text(args: TextArgs) -> anyhow::Result<()> {
    let f = std::fs::File::open(&args.style)
        .with_context(|| format!("open style '{}'", args.style.display()))?;
    let style: TextStyle = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse style '{}'", args.style.display()))?;
    let opts = match &args.config {
        Some(path) => EditorConfig::from_path(path)?.text,
        None => TextRasterOptions::default(),
    };

    let mut rasterizer = TextRasterizer::new(load_fonts(&args.fonts)?, opts);
    let text = rasterizer.render(&style)?;
    write_png(&args.out, &text.to_png()?)?;
    println!("{}x{}", text.width, text.height);
    Ok(())
}

/// Pixels from an assets directory; text images are re-captured from their style records.
struct DirAssets {
    root: PathBuf,
    text: Option<TextRasterizer>,
}

impl DirAssets {
    fn load(&self, name: &str) -> StrataResult<Option<DecodedImage>> {
        let path = self.root.join(name);
        let Ok(bytes) = std::fs::read(&path) else {
            eprintln!("skipping '{}': not found", path.display());
            return Ok(None);
        };
        decode_any(&bytes).map(Some)
    }
}

impl CanvasAssets for DirAssets {
    fn background_pixels(&mut self, background: &Background) -> StrataResult<Option<DecodedImage>> {
        self.load(&background.display_name)
    }

    fn image_pixels(&mut self, image: &LayerImage) -> StrataResult<Option<DecodedImage>> {
        if image.source_kind != SourceKind::Text {
            return self.load(&image.name);
        }
        let (Some(style), Some(text)) = (&image.style, self.text.as_mut()) else {
            eprintln!("skipping text image '{}': no style or no --fonts", image.name);
            return Ok(None);
        };
        let captured = text.render(style)?;
        Ok(Some(DecodedImage {
            width: captured.width,
            height: captured.height,
            rgba8_premul: captured.rgba8_premul,
        }))
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let snap = SessionSnapshot::from_path(&args.snapshot)?;
    let text = match &args.fonts {
        Some(dir) => Some(TextRasterizer::new(
            load_fonts(dir)?,
            TextRasterOptions::default(),
        )),
        None => None,
    };
    let mut assets = DirAssets {
        root: args.assets.clone(),
        text,
    };
    let opts = CanvasOptions::default().with_clear(ColorRgba8::parse(&args.clear)?);
    let container = ContainerSize::new(f64::from(args.width), f64::from(args.height));
    let frame = compose_canvas(&snap.store, container, &mut assets, &opts)?;
    write_png(&args.out, &frame.to_png()?)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let snap = SessionSnapshot::from_path(&args.snapshot)?;
    let config = LayerConfiguration::from_store(&snap.store);
    println!("{}", serde_json::to_string_pretty(&config)?);

    if snap.store.background().is_some_and(|b| !b.is_resolved()) {
        eprintln!("unresolved: background");
    }
    for u in snap.store.unresolved(false) {
        let name = snap
            .store
            .layer(u.layer)
            .map_or("?", |l| l.name.as_str());
        eprintln!("unresolved: layer \"{name}\" image {}", u.image.0);
    }
    Ok(())
}
