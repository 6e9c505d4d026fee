use anyhow::Result;
use respondo::{Responder, ResponseProvider, ResponseRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = Responder::new(api_key)?;

    let request = ResponseRequest::new("openai/gpt-5", "What is the capital of France?");

    let response = client.respond(request).await?;

    println!("Response: {}", response.output_text());

    if let Some(usage) = &response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
