use clap::{Parser, ValueEnum};
use pcbdoc_import::parsers::altium::ascii::DEFAULT_BLOCK_SIZE;
use pcbdoc_import::parsers::altium::units::mil;
use pcbdoc_import::{import, import_reader, Dialect, ImportError, ImportOptions};
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pcbdoc-import", about = "Convert a PcbDoc board to JSON")]
struct Cli {
    /// Input .PcbDoc file, ASCII or binary
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Override the sniffed dialect
    #[arg(long, value_enum)]
    dialect: Option<DialectArg>,

    /// Read size of the ASCII tokenizer in bytes
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Clearance in mil when no rule applies
    #[arg(long, default_value_t = 10.0)]
    clearance: f64,

    /// Solder mask expansion in mil for pads without a manual value
    #[arg(long, default_value_t = 4.0)]
    mask_expansion: f64,

    /// Paste expansion in mil for pads without a manual value
    #[arg(long, default_value_t = 0.0)]
    paste_expansion: f64,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Ascii,
    Binary,
}

impl From<DialectArg> for Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Ascii => Dialect::Ascii,
            DialectArg::Binary => Dialect::Binary,
        }
    }
}

fn run(cli: &Cli) -> Result<(), ImportError> {
    let opts = ImportOptions {
        block_size: cli.block_size.max(1),
        default_clearance: mil(cli.clearance),
        default_mask_expansion: mil(cli.mask_expansion),
        default_paste_expansion: mil(cli.paste_expansion),
    };

    let result = match cli.dialect {
        Some(dialect) => import_reader(File::open(&cli.input)?, dialect.into(), &opts)?,
        None => import(&cli.input, &opts)?,
    };
    if !result.diagnostics.is_empty() {
        eprintln!("{} records skipped", result.diagnostics.len());
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result.board)?
    } else {
        serde_json::to_string(&result.board)?
    };

    if let Some(output_path) = &cli.output {
        std::fs::write(output_path, &json)?;
        eprintln!("Written to {}", output_path.display());
    } else {
        println!("{json}");
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
