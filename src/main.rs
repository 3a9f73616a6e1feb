fn main() {
    if let Err(err) = csv_sqltypes::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
