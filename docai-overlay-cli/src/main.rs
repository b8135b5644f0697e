use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docai_overlay::model::{Document, Entity};
use docai_overlay::ordering::page_index;
use docai_overlay::{
    layout_page, order_document, page_image_data, render_svg, sort_by_type, DocumentSummary,
    Highlight, OverlayOptions, PageOverlay, Size,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docai-overlay",
    about = "Reading order and bounding-box overlays for Document AI results",
    version,
    author
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the document with its entities in reading order
    Order {
        /// Input JSON file (Document or response envelope)
        input: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// List entities, one per line, properties indented
    Entities {
        /// Input JSON file
        input: PathBuf,

        /// Sort by entity type instead of reading order
        #[arg(long)]
        by_type: bool,
    },

    /// Print the overlay layout of one page as JSON
    Layout {
        /// Input JSON file
        input: PathBuf,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Render one page with its entity boxes as SVG
    Svg {
        /// Input JSON file
        input: PathBuf,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        overlay: OverlayArgs,
    },

    /// Show document details: pages, layout elements, entity counts
    Info {
        /// Input JSON file
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct OverlayArgs {
    /// Viewport width in pixels
    #[arg(long)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long)]
    height: f64,

    /// Page index (0-based)
    #[arg(short = 'p', long, default_value = "0")]
    page: usize,

    /// Entity id to highlight
    #[arg(long)]
    highlight: Option<String>,

    /// Margin around the page image, in pixels
    #[arg(long, default_value = "0")]
    margin: f64,

    /// Also draw the properties of composite entities
    #[arg(long)]
    properties: bool,

    /// Also draw the page's OCR blocks
    #[arg(long)]
    blocks: bool,

    /// Also draw form field names and values
    #[arg(long)]
    form_fields: bool,
}

impl OverlayArgs {
    fn layout(&self, document: &Document) -> Result<PageOverlay> {
        let options = OverlayOptions {
            image_margin: self.margin,
            include_properties: self.properties,
            include_blocks: self.blocks,
            include_form_fields: self.form_fields,
        };
        let highlight = Highlight::from(self.highlight.as_deref());
        let overlay = layout_page(
            document,
            self.page,
            Size::new(self.width, self.height),
            &highlight,
            &options,
        )
        .with_context(|| format!("Failed to lay out page {}", self.page))?;
        Ok(overlay)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(input: &Path) -> Result<Document> {
    let document = Document::open(input)
        .with_context(|| format!("Failed to read document from {}", input.display()))?;
    tracing::debug!(
        "Loaded {} pages and {} entities from {}",
        document.page_count(),
        document.entities().len(),
        input.display()
    );
    Ok(document)
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            eprintln!("✓ Written to: {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}

fn print_entity(entity: &Entity, depth: usize) {
    println!(
        "{indent}p{page}\t{kind}\t{confidence:.2}\t{text}",
        indent = "  ".repeat(depth),
        page = page_index(entity),
        kind = entity.entity_type,
        confidence = entity.confidence,
        text = entity.display_text().replace('\n', " ")
    );
    for property in &entity.properties {
        print_entity(property, depth + 1);
    }
}

fn print_summary(summary: &DocumentSummary) {
    println!("Document Information");
    println!("====================");
    if let Some(uri) = &summary.uri {
        println!("URI: {uri}");
    }
    if let Some(mime_type) = &summary.mime_type {
        println!("MIME type: {mime_type}");
    }
    println!("Pages: {}", summary.page_count);
    println!(
        "Entities: {} ({} including properties, {} drawable)",
        summary.entity_count, summary.total_entity_count, summary.drawable_count
    );

    if !summary.entities_by_type.is_empty() {
        println!("\nEntities by type:");
        for (kind, count) in &summary.entities_by_type {
            println!("  {kind}: {count}");
        }
    }

    for page in &summary.pages {
        println!("\nPage {}:", page.page_number);
        if let (Some(width), Some(height)) = (page.width, page.height) {
            println!(
                "  Dimension: {width:.0}x{height:.0} {}",
                page.unit.as_deref().unwrap_or("")
            );
        }
        if let (Some(width), Some(height)) = (page.image_width, page.image_height) {
            println!("  Image: {width:.0}x{height:.0} px");
        }
        if !page.languages.is_empty() {
            println!("  Languages: {}", page.languages.join(", "));
        }
        println!(
            "  Blocks: {}, paragraphs: {}, lines: {}, tokens: {}",
            page.blocks, page.paragraphs, page.lines, page.tokens
        );
        println!("  Tables: {}, form fields: {}", page.tables, page.form_fields);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Order {
            input,
            output,
            compact,
        } => {
            let ordered = order_document(&load(&input)?);
            let json = if compact {
                ordered.to_json_compact()?
            } else {
                ordered.to_json()?
            };
            write_output(output.as_deref(), &json)?;
        }

        Commands::Entities { input, by_type } => {
            let document = load(&input)?;
            let entities = if by_type {
                sort_by_type(document.entities())
            } else {
                order_document(&document).entities().to_vec()
            };
            for entity in &entities {
                print_entity(entity, 0);
            }
        }

        Commands::Layout { input, overlay } => {
            let document = order_document(&load(&input)?);
            let layout = overlay.layout(&document)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }

        Commands::Svg {
            input,
            output,
            overlay,
        } => {
            let document = order_document(&load(&input)?);
            let layout = overlay.layout(&document)?;
            let page = document.page(overlay.page)?;
            let image = page_image_data(page, overlay.page).ok();
            let svg = render_svg(&layout, image).context("Failed to render SVG")?;
            write_output(Some(&output), &svg)?;
        }

        Commands::Info { input, json } => {
            let summary = DocumentSummary::from_document(&load(&input)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}
