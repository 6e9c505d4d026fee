use anyhow::Result;
use respondo::{Reasoning, Responder, ResponseProvider, ResponseRequest, StreamEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = Responder::new(api_key)?;

    let request = ResponseRequest::new(
        "openai/gpt-5",
        "Explain how photosynthesis works at the molecular level.",
    )
    .with_reasoning(Reasoning::medium());

    println!("Streaming response:\n");

    let mut stream = client.respond_stream(request).await?;
    let mut reasoning_displayed = false;

    while let Some(event) = stream.next_event().await {
        match event? {
            StreamEvent::ReasoningDelta { delta, .. } => {
                if !reasoning_displayed {
                    println!("[REASONING]");
                    reasoning_displayed = true;
                }
                print!("{}", delta);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            StreamEvent::TextDelta { delta, .. } => {
                if reasoning_displayed {
                    println!("\n\n[RESPONSE]");
                    reasoning_displayed = false;
                }
                print!("{}", delta);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            StreamEvent::Completed { response } => {
                println!("\n\nDone.");
                if let Some(usage) = &response.usage {
                    println!("Tokens used: {}", usage.total_tokens);
                }
            }
            _ => {}
        }
    }

    Ok(())
}
