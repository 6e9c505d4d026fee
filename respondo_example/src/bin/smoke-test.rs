use anyhow::Result;
use respondo::{Responder, ResponseProvider, ResponseRequest};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    println!("OpenRouter Connection Test");
    println!("==========================");
    println!();

    let model = std::env::var("RESPONDO_MODEL").unwrap_or_else(|_| "openai/gpt-5".to_string());

    print!("Creating client from environment... ");
    let client = Responder::from_env()?;
    println!("✓");

    print!("Sending a one-word request to {}... ", model);
    let request = ResponseRequest::new(&model, "Reply with the single word: pong")
        .with_max_output_tokens(16);
    let response = client.respond(request).await?;
    println!("✓");
    println!();

    println!("Response id: {}", response.id);
    println!("Status: {:?}", response.status);
    println!("Output: {}", response.output_text());

    if let Some(usage) = &response.usage {
        println!(
            "Tokens: {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }

    Ok(())
}
