use clap::Parser;
use loxwalk::prelude::Config;
use loxwalk::Lox;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;

#[derive(Debug, Parser)]
#[command(name = "loxwalk", version, about = "Tree-walking Lox interpreter")]
struct Cli {
    /// Script to run. Starts a REPL when omitted.
    script: Option<String>,

    /// Deepest allowed nesting of function calls.
    #[arg(long, default_value_t = Config::DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Print the parsed program before running it.
    #[arg(long)]
    dump_ast: bool,

    /// Log interpreter activity to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(EX_USAGE);
        }
        // --help and --version
        Err(e) => e.exit(),
    };

    init_tracing(cli.verbose);

    let config = Config::new().with_max_call_depth(cli.max_call_depth);
    let mut lox = Lox::with_config(config).with_ast_dump(cli.dump_ast);

    match cli.script {
        Some(script) => {
            lox.run_file(&script)?;

            if lox.had_error() {
                std::process::exit(EX_DATAERR);
            }
            if lox.had_runtime_error() {
                std::process::exit(EX_SOFTWARE);
            }
            Ok(())
        }
        None => lox.run_prompt(),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder().with_default_directive(LevelFilter::WARN.into()).from_env_lossy()
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
