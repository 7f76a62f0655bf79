#[tokio::main]
async fn main() -> eyre::Result<()> {
    user_events_worker::run().await
}
