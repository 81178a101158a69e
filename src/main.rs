#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bakong_gateway_lib::run().await
}
