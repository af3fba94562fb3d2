fn main() {
    if let Err(err) = article_usage::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
