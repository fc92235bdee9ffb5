//! Converts an image into ICO and ICNS files, or lists the contents of an
//! existing icon file.
//!
//! ```shell
//! icondrop convert path/to/logo.png
//! # ICO and ICNS will be saved to path/to/logo.ico and path/to/logo.icns
//! icondrop inspect path/to/logo.icns
//! ```

use clap::{Parser, Subcommand};
use icondrop::{Config, ContainResizer, Converter, IconDir, IconFamily,
               MimeType, SourceImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icondrop")]
#[command(about = "Convert an image into Windows ICO and macOS ICNS icons")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PNG or JPEG image into an .ico and an .icns file
    Convert {
        /// Input image
        input: PathBuf,
        /// Directory to write the icons to (defaults to the input's)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Input type, if it can't be told from the extension
        #[arg(long)]
        mime: Option<String>,
    },
    /// List the images stored in an .ico or .icns file
    Inspect {
        /// Icon file
        input: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = load_config(cli.config.as_deref()).and_then(|config| {
        match cli.command {
            Commands::Convert { input, out_dir, mime } => {
                convert(&config, &input, out_dir.as_deref(), mime.as_deref())
            }
            Commands::Inspect { input } => inspect(&input),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> icondrop::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

fn convert(config: &Config,
           input: &Path,
           out_dir: Option<&Path>,
           mime: Option<&str>)
           -> icondrop::Result<()> {
    let mime = match mime {
        Some(mime) => mime.parse::<MimeType>()?,
        None => {
            let extension = input.extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("");
            extension.parse::<MimeType>()?
        }
    };
    let source = SourceImage::new(fs::read(input)?, mime, config.max_source_bytes)?;
    let set = Converter::new(ContainResizer::new()).convert(&source)?;

    let out_dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    fs::create_dir_all(&out_dir)?;
    let stem = input.file_stem()
        .unwrap_or(input.as_os_str())
        .to_string_lossy();
    let ico_path = out_dir.join(format!("{}.ico", stem));
    let icns_path = out_dir.join(format!("{}.icns", stem));
    fs::write(&ico_path, &set.ico)?;
    fs::write(&icns_path, &set.icns)?;
    info!(ico = %ico_path.display(), icns = %icns_path.display(), "wrote icons");
    Ok(())
}

fn inspect(input: &Path) -> icondrop::Result<()> {
    let data = fs::read(input)?;
    if data.starts_with(b"icns") {
        let family = IconFamily::read(Cursor::new(&data))?;
        println!("ICNS, {} bytes, {} elements", family.total_length(),
                 family.elements.len());
        for element in &family.elements {
            let size = element.icon_type()
                .map(|icon_type| format!("{}px", icon_type.pixel_width()))
                .unwrap_or_else(|| "unknown".to_string());
            println!("  {} {:>7} {:>9} bytes",
                     element.ostype(),
                     size,
                     element.data().len());
        }
    } else {
        let dir = IconDir::read(Cursor::new(&data))?;
        println!("ICO, {} bytes, {} entries", data.len(), dir.entries().len());
        for (entry, (size, offset)) in dir.entries().iter().zip(dir.layout()) {
            println!("  {:>4}px {:>9} bytes at {}", entry.edge(), size, offset);
        }
    }
    Ok(())
}
