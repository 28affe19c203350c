//! One-shot commands against the configured store

pub async fn ask(query: &str) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let cache = crate::create_learning_cache(&config).await?;

    let response = cache.serve(query).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    cache.repository().close().await;
    Ok(())
}

pub async fn stats() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let cache = crate::create_learning_cache(&config).await?;

    let stats = cache.statistics().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    cache.repository().close().await;
    Ok(())
}
