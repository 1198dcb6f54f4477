//! # Etiqueta CLI
//!
//! Command-line interface for designing and printing product labels on
//! TSPL thermal label printers.
//!
//! ## Usage
//!
//! ```bash
//! # Show the TSPL script for a product
//! etiqueta script --product pen.json
//!
//! # Render a PNG preview of the label
//! etiqueta preview --product pen.json --png label.png
//!
//! # Print two copies of the second colour variant
//! etiqueta print --product pen.json --variant 1 --copies 2 --printer "TSC TE244"
//!
//! # Calibrate: shift everything 1mm right, use 300 DPI
//! etiqueta calibrate set offset_x_mm=1 dpi=300
//!
//! # Run the HTTP API for the admin front-end
//! etiqueta serve --listen 0.0.0.0:8080 --catalog https://shop.example/api
//! ```

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use etiqueta::{
    EtiquetaError, composer,
    preview::render_preview,
    printer::{CalibrationProfile, CalibrationStore, JsonFileStore},
    product::{ProductSelection, SelectedProduct},
    render::SoftwareRasterizer,
    search::{ProductSource, RestCatalog},
    server::{self, ServerConfig},
    transport::{DEFAULT_BRIDGE_URL, PrintSession, WebSocketBridge},
};

/// Etiqueta - Barcode label designer for thermal label printers
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Calibration file
    #[arg(long, global = true, env = "ETIQUETA_CALIBRATION", default_value = "calibration.json")]
    calibration: PathBuf,

    /// TrueType font for label text (built-in bitmap font when omitted)
    #[arg(long, global = true, env = "ETIQUETA_FONT")]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which product goes on the label.
#[derive(clap::Args, Debug)]
struct LabelArgs {
    /// Product JSON file, `-` for stdin
    #[arg(long, value_name = "FILE")]
    product: PathBuf,

    /// Colour variant index (defaults to the first)
    #[arg(long)]
    variant: Option<usize>,

    /// Copies (defaults to the calibrated count)
    #[arg(long)]
    copies: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the TSPL script for a label
    Script {
        #[command(flatten)]
        label: LabelArgs,

        /// Write the script to a file instead of stdout
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a label preview
    Preview {
        #[command(flatten)]
        label: LabelArgs,

        /// PNG output file
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Print element positions (CSS pixels) as JSON
        #[arg(long)]
        positions: bool,
    },

    /// Print a label through the print bridge
    Print {
        #[command(flatten)]
        label: LabelArgs,

        /// Printer name as reported by `etiqueta printers`
        #[arg(long)]
        printer: String,

        /// Print bridge websocket URL
        #[arg(long, env = "ETIQUETA_BRIDGE", default_value = DEFAULT_BRIDGE_URL)]
        bridge: String,
    },

    /// List printers reachable through the print bridge
    Printers {
        /// Print bridge websocket URL
        #[arg(long, env = "ETIQUETA_BRIDGE", default_value = DEFAULT_BRIDGE_URL)]
        bridge: String,
    },

    /// Show or change the calibration profile
    Calibrate {
        #[command(subcommand)]
        action: CalibrateAction,
    },

    /// Search the product catalog
    Search {
        /// Search text
        query: String,

        /// Product API base URL
        #[arg(long, env = "ETIQUETA_CATALOG")]
        catalog: String,

        /// Bearer token for the product API
        #[arg(long, env = "ETIQUETA_CATALOG_TOKEN")]
        token: Option<String>,
    },

    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Print bridge websocket URL
        #[arg(long, env = "ETIQUETA_BRIDGE", default_value = DEFAULT_BRIDGE_URL)]
        bridge: String,

        /// Product API base URL (suggestions disabled when omitted)
        #[arg(long, env = "ETIQUETA_CATALOG")]
        catalog: Option<String>,

        /// Bearer token for the product API
        #[arg(long, env = "ETIQUETA_CATALOG_TOKEN")]
        token: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CalibrateAction {
    /// Show the current profile
    Show,
    /// Set fields, e.g. `dpi=300 header_layout=column`
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },
    /// Restore the defaults
    Reset,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etiqueta=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();
    let store = JsonFileStore::new(&cli.calibration);
    let rasterizer = match &cli.font {
        Some(path) => SoftwareRasterizer::with_font_file(path)?,
        None => SoftwareRasterizer::new(),
    };

    match cli.command {
        Commands::Script { label, output } => {
            let selection = load_selection(&label)?;
            let script = composer::compose(&rasterizer, &store.load(), &selection, label.copies);
            match output {
                Some(path) => {
                    fs::write(&path, script.to_bytes())?;
                    println!("Wrote {} commands to {}", script.len(), path.display());
                }
                None => print!("{}", script),
            }
            Ok(())
        }

        Commands::Preview {
            label,
            png,
            positions,
        } => {
            let selection = load_selection(&label)?;
            let preview = render_preview(&rasterizer, &store.load(), &selection);

            if positions || png.is_none() {
                let json = serde_json::to_string_pretty(&preview.positions)
                    .map_err(|e| EtiquetaError::InvalidCommand(e.to_string()))?;
                println!("{}", json);
            }
            if let Some(path) = png {
                fs::write(&path, preview.to_png()?)?;
                println!(
                    "Saved {}x{} preview to {}",
                    preview.image.width(),
                    preview.image.height(),
                    path.display()
                );
                if !preview.barcode_rendered && preview.content.code.is_some() {
                    println!("Note: barcode could not be encoded and was left out");
                }
            }
            Ok(())
        }

        Commands::Print {
            label,
            printer,
            bridge,
        } => {
            let selection = load_selection(&label)?;
            let profile = store.load();
            runtime()?.block_on(async {
                let mut session = PrintSession::new(WebSocketBridge::new(bridge));
                session.connect().await?;
                session.select_printer(&printer)?;
                println!("Printing label for {}...", selection.product().name);
                session
                    .print_label(&rasterizer, &profile, &selection, label.copies)
                    .await?;
                println!("Printed successfully!");
                Ok::<(), EtiquetaError>(())
            })
        }

        Commands::Printers { bridge } => runtime()?.block_on(async {
            let mut session = PrintSession::new(WebSocketBridge::new(bridge));
            session.connect().await?;
            let printers = session.find_printers().await?;
            if printers.is_empty() {
                println!("No printers found.");
            } else {
                println!("Available printers:");
                for name in printers {
                    println!("  {}", name);
                }
            }
            Ok::<(), EtiquetaError>(())
        }),

        Commands::Calibrate { action } => {
            let profile = match action {
                CalibrateAction::Show => store.load(),
                CalibrateAction::Set { fields } => store.update(&parse_fields(&fields)?),
                CalibrateAction::Reset => {
                    let defaults = CalibrationProfile::default();
                    store.save(&defaults);
                    defaults
                }
            };
            let json = serde_json::to_string_pretty(&profile)
                .map_err(|e| EtiquetaError::InvalidCommand(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }

        Commands::Search {
            query,
            catalog,
            token,
        } => {
            let catalog = RestCatalog::new(&catalog, token)?;
            let products = runtime()?.block_on(catalog.search(&query))?;
            if products.is_empty() {
                println!("No products match \"{}\".", query);
            }
            for product in products {
                let code = product.barcode.as_deref().unwrap_or(&product.sku);
                println!("  {:<32} {:>10.2}  {}", product.name, product.price, code);
                for variant in &product.variants {
                    println!("    - {:<28} {}  (stock {})", variant.color, variant.sku, variant.stock);
                }
            }
            Ok(())
        }

        Commands::Serve {
            listen,
            bridge,
            catalog,
            token,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                calibration_path: cli.calibration.clone(),
                bridge_url: bridge,
                catalog_url: catalog,
                catalog_token: token,
                font_path: cli.font.clone(),
            };
            runtime()?.block_on(server::serve(config))
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, EtiquetaError> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Read the product JSON and select the requested variant.
fn load_selection(args: &LabelArgs) -> Result<ProductSelection, EtiquetaError> {
    let raw = read_input(&args.product)?;
    let product: SelectedProduct = serde_json::from_str(&raw)
        .map_err(|e| EtiquetaError::Config(format!("invalid product JSON: {}", e)))?;
    ProductSelection::with_variant(product, args.variant)
}

fn read_input(path: &Path) -> Result<String, EtiquetaError> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

/// Parse `key=value` pairs; values are JSON when they parse, else strings.
fn parse_fields(fields: &[String]) -> Result<Map<String, Value>, EtiquetaError> {
    let mut patch = Map::new();
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(EtiquetaError::InvalidCommand(format!(
                "expected KEY=VALUE, got '{}'",
                field
            )));
        };
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        patch.insert(key.trim().to_string(), value);
    }
    Ok(patch)
}

