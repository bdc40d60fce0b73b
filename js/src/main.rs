use js_conformance::harness::Suite;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Parser)]
#[command(name = "js-conform", version, about = "Run JSON.parse and Array.prototype.map conformance checks")]
struct Cli {
    /// Run only checks whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the check names and exit
    #[arg(short, long)]
    list: bool,

    /// Extra text that JSON.parse must reject (repeatable)
    #[arg(long = "json-reject", value_name = "TEXT")]
    json_reject: Vec<String>,

    /// Extra text that JSON.parse must accept (repeatable)
    #[arg(long = "json-accept", value_name = "TEXT")]
    json_accept: Vec<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

fn main() {
    // Initialize logger (controlled by RUST_LOG)
    env_logger::init();

    let cli = <Cli as clap::Parser>::parse();

    let mut suite = Suite::builtin();
    for text in &cli.json_reject {
        suite.add_invalid_json(text);
    }
    for text in &cli.json_accept {
        suite.add_valid_json(text);
    }
    if let Some(pattern) = cli.filter.as_deref() {
        suite = suite.filter(pattern);
    }

    if cli.list {
        for name in suite.names() {
            println!("{name}");
        }
        return;
    }

    if suite.is_empty() {
        log::warn!("no checks selected");
    }

    let report = suite.run();
    match cli.format {
        Format::Text => println!("{report}"),
        Format::Json => println!("{:#}", report.to_json()),
    }
    if !report.is_success() {
        std::process::exit(1);
    }
}
