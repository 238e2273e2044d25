use log::error;
use std::io::{self, Write};
use std::panic;

pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // The log file is often the only trace a user can send back.
        error!("{panic_info}");
        log::logger().flush();

        restore_output();
        default_hook(panic_info);

        std::process::exit(1);
    }));
}

/// Leave stdout/stderr in a clean state, e.g. after a partial JSON line or an
/// unanswered password prompt.
pub fn restore_output() {
    let _ = io::stdout().flush();
    let _ = writeln!(io::stderr());
}
