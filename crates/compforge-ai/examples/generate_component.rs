use std::sync::Arc;

use compforge_ai::prelude::*;
use compforge_ai::upstream::OpenRouterClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = GenerationService::new(Arc::new(OpenRouterClient::from_env()?));

    let history = vec![HistoryMessage::user("I am building a SaaS landing page.")];
    let result = service
        .generate("A hero section with a headline, subtitle and two buttons", &history)
        .await?;

    println!("{}", result.jsx_code);
    if !result.css_code.is_empty() {
        println!("\n/* css */\n{}", result.css_code);
    }
    Ok(())
}
