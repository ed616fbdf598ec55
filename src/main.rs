//! kl - command-line client for keelson

fn main() {
    if let Err(err) = keelson::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
