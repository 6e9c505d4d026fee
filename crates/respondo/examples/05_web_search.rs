use anyhow::Result;
use respondo::{Annotation, Plugin, Responder, ResponseProvider, ResponseRequest};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = Responder::new(api_key)?;

    let request = ResponseRequest::new(
        "openai/gpt-5",
        "What were the biggest science news stories this week?",
    )
    .with_plugins(vec![Plugin::web().with_max_results(3)]);

    let response = client.respond(request).await?;

    println!("Response: {}\n", response.output_text());

    let citations = response.citations();
    if !citations.is_empty() {
        println!("Sources:");
        for annotation in citations {
            if let Annotation::UrlCitation { url, title, .. } = annotation {
                println!("- {} ({})", title.as_deref().unwrap_or("untitled"), url);
            }
        }
    }

    Ok(())
}
