fn main() {
    if let Err(e) = pacmir_cli::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
