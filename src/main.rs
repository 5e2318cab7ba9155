fn main() {
    if let Err(e) = bioscan_lib::run() {
        eprintln!("bioscan: {e}");
        std::process::exit(1);
    }
}
