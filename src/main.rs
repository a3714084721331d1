fn main() {
    if let Err(err) = listings_explorer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
