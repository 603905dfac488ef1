//! jscol command line entry point.

use jscol::cli::{self, EXIT_OK, EXIT_PARTIAL, EXIT_RUNTIME, exit_code_for};
use jscol::tracing::{TracingConfig, init_tracing};
use jscol::render_summary;

fn main() {
    // NOTE: eprintln! in the panic hook is intentional; tracing may be unusable during a panic.
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        filter: None,
    }) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{e:?}");
        }
        std::process::exit(EXIT_RUNTIME);
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            }
            std::process::exit(EXIT_RUNTIME);
        }
    };

    let exit_code = match rt.block_on(jscol::run(&cli)) {
        Ok(report) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{}", render_summary(&report));
            }
            if report.has_failures() {
                EXIT_PARTIAL
            } else {
                EXIT_OK
            }
        }
        Err(err) => {
            let code = exit_code_for(&err);
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{:?}", miette::Report::new(err));
            }
            code
        }
    };

    drop(rt);
    std::process::exit(exit_code);
}
