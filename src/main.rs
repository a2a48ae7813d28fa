use log::error;

use etfplot::chart::{render_fund, SvgRenderer};
use etfplot::errors::*;
use etfplot::*;

use etfplot::args::*;

// Rust doesn't trap a unix signal appropriately occasionally: https://github.com/rust-lang/rust/issues/46016
fn reset_signal_pipe_handler() -> Result<()> {
    #[cfg(target_family = "unix")]
    {
        use nix::sys::signal;

        unsafe {
            signal::signal(signal::Signal::SIGPIPE, signal::SigHandler::SigDfl)
                .chain_err(|| "Internal error: cannot trap signal")?;
        }
    }

    Ok(())
}

fn main() {
    if let Err(ref e) = reset_signal_pipe_handler().and_then(|_| run()) {
        let mut s = e.to_string();

        for e in e.iter().skip(1) {
            s.push_str(&format!("\n\tcaused by: {}", e));
        }

        // with `RUST_BACKTRACE=1`.
        if let Some(backtrace) = e.backtrace() {
            s.push_str(&format!("\n\tbacktrace:\n{:?}", backtrace));
        }

        error!("{}", s);

        ::std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let opts = parse_args();

    stderrlog::new()
        .module(module_path!())
        .show_level(false)
        .quiet(opts.quiet)
        .verbosity(opts.verbose + 1) // The user needs warnings
        .timestamp(opts.ts.unwrap_or(stderrlog::Timestamp::Off))
        .init()
        .chain_err(|| "Cannot initialize logging")?;

    let data_dir = DataDir::open(opts.directory.as_deref().unwrap_or(".".as_ref()))?;

    match opts.subcmd.unwrap_or(SubCommand::Plot { fund: None }) {
        SubCommand::Check {} => {
            println!(fmt_summary!(), "TICKER", "NAME", "ROWS", "FIRST", "LAST");
            data_dir.check()?.iter().for_each(|s| println!("{}", s));
            Ok(())
        }
        SubCommand::Plot { fund } => {
            let funds = data_dir.load_all(fund.as_deref())?;
            let out_dir = opts.out.unwrap_or_else(|| "charts".into());
            let mut renderer = SvgRenderer::new(&out_dir, !opts.no_wait)?;

            for f in &funds {
                render_fund(&mut renderer, f, RECENT_WINDOW)?;
            }
            Ok(())
        }
    }
}
