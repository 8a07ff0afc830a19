use human_panic::setup_panic;

fn main() {
    setup_panic!();

    if let Err(err) = ptxsim::cli::run_cli() {
        // Use the logger if it is ready, so the error also ends up in the log file
        if ptxsim::log::is_logger_initialised() {
            ::log::error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        std::process::exit(1);
    }
}
