use anyhow::Result;
use respondo::{Responder, ResponseProvider, ResponseRequest, TextConfig};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
struct CityFacts {
    name: String,
    country: String,
    population: u64,
    landmarks: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = Responder::new(api_key)?;

    let request = ResponseRequest::new("openai/gpt-5", "Give me basic facts about Lisbon.")
        .with_text_format(TextConfig::json_schema::<CityFacts>("city_facts"));

    let response = client.respond(request).await?;

    match response.parse_output::<CityFacts>() {
        Some(facts) => {
            println!("{} ({})", facts.name, facts.country);
            println!("Population: {}", facts.population);
            for landmark in &facts.landmarks {
                println!("- {}", landmark);
            }
        }
        None => {
            println!("Unexpected output shape:\n{}", response.output_text());
        }
    }

    Ok(())
}
