use exan::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("exan: {e}");
            eprintln!(
                "Usage: exan [-e<script>] [-f<file>] [-D<name>=<value>]... [-s<scale>] [-r<rounding>] [-c<config>] [-td]"
            );
            std::process::exit(1);
        }
    };

    // ── Logging: RUST_LOG, or debug everywhere with -d ───────────────────────
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ── Settings: config file, then flag overrides ──────────────────────────
    let (config, warnings) = cli::build_config(&args);
    for w in warnings {
        eprintln!("exan: warning: {w}");
    }

    let source = match cli::read_script(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("exan: {e}");
            std::process::exit(1);
        }
    };

    let mut expr = cli::build_expression(source, &args, config);
    match expr.evaluate() {
        Ok(value) => {
            if let Some(v) = value {
                println!("{v}");
            }
            if args.print_table {
                for (name, value) in expr.variables().sorted() {
                    println!("{name} = {value}");
                }
            }
        }
        Err(e) => {
            eprintln!("exan: {e}");
            std::process::exit(1);
        }
    }
}
