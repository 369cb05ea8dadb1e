use std::sync::Arc;

use compforge_ai::prelude::*;
use compforge_ai::upstream::OpenRouterClient;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = GenerationService::new(Arc::new(OpenRouterClient::from_env()?));

    let (mut tx, mut rx) = mpsc::channel::<StreamEvent>(64);
    let producer = tokio::spawn(async move {
        service
            .generate_streaming("A toggle switch with a label", &[], &mut tx)
            .await;
    });

    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Delta(text) => print!("{text}"),
            StreamEvent::Done(result) => println!("\n\n--- jsx ---\n{}", result.jsx_code),
            StreamEvent::Error(reason) => eprintln!("stream error: {reason}"),
        }
    }

    producer.await?;
    Ok(())
}
