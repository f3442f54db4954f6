#[tokio::main]
async fn main() {
    if let Err(e) = pr_reviewer_lib::run().await {
        log::error!("[server] {}", e);
        std::process::exit(1);
    }
}
