#[tokio::main]
async fn main() {
    if let Err(e) = geolens::run().await {
        eprintln!("geolens: {e}");
        std::process::exit(1);
    }
}
