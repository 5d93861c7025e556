//! `thumbforge` command-line tool: render documents and migrate between
//! storage versions.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use thumbforge_core::{Document, migrate};
use thumbforge_render::{
    AssetLoader, ExportConfig, ExportFormat, FileAssetSource, FontConfig, export,
};

#[derive(Parser, Debug)]
#[command(name = "thumbforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document to a 1280x720 PNG or JPEG.
    Render(RenderArgs),
    /// Convert a document between storage versions.
    Migrate(MigrateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VersionArg {
    V1,
    V2,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON (version 1 or 2).
    input: PathBuf,

    /// Output image path.
    #[arg(short, long)]
    out: PathBuf,

    /// Output format. Defaults to the output file extension, then PNG.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Directory relative image URLs resolve against. Defaults to the
    /// input file's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// JPEG quality, 1-100.
    #[arg(long, default_value_t = thumbforge_render::DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// Extra font files to load.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Skip system fonts.
    #[arg(long, default_value_t = false)]
    no_system_fonts: bool,
}

#[derive(Parser, Debug)]
struct MigrateArgs {
    /// Input document JSON (version 1 or 2).
    input: PathBuf,

    /// Output path.
    #[arg(short, long)]
    out: PathBuf,

    /// Target version.
    #[arg(long, value_enum, default_value_t = VersionArg::V2)]
    to: VersionArg,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Migrate(args) => cmd_migrate(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse '{}'", path.display()))?;
    let document = migrate::parse_document(value)
        .with_context(|| format!("load document '{}'", path.display()))?;
    log::info!("Loaded {} object(s) from {}", document.len(), path.display());
    Ok(document)
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let document = read_document(&args.input)?;

    let format = args
        .format
        .map(ExportFormat::from)
        .or_else(|| {
            args.out
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ExportFormat::from_extension)
        })
        .unwrap_or_default();

    let mut font_data = Vec::with_capacity(args.fonts.len());
    for font in &args.fonts {
        font_data
            .push(std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?);
    }
    let config = ExportConfig {
        jpeg_quality: args.quality,
        fonts: FontConfig {
            load_system_fonts: !args.no_system_fonts,
            font_data,
        },
    };

    let assets_root = args.assets.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let mut assets = AssetLoader::new(FileAssetSource::new(assets_root));

    let output = export(&document, &mut assets, format, &config)?;
    write_output(&args.out, &output.bytes)?;

    eprintln!(
        "wrote {} ({}x{} {})",
        args.out.display(),
        output.width,
        output.height,
        output.mime_type()
    );
    Ok(())
}

fn cmd_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let document = read_document(&args.input)?;
    let value = match args.to {
        VersionArg::V1 => migrate::to_storage_value(&document)?,
        VersionArg::V2 => serde_json::to_value(&document)?,
    };
    let json = serde_json::to_string_pretty(&value)?;
    write_output(&args.out, json.as_bytes())?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
