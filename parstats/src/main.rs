fn main() {
    if let Err(e) = parstats::run() {
        eprintln!("parstats: {e:#}");
        std::process::exit(1);
    }
}
