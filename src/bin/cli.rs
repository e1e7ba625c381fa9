use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    homeboard::cli::run().await
}
