use anyhow::Result;
use respondo::{InputItem, Responder, ResponseProvider, ResponseRequest, Tool};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("OPENROUTER_API_KEY")?;
    let client = Responder::new(api_key)?;

    let weather_tool = Tool::function(
        "get_weather",
        "Get the current weather for a city",
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name"}
            },
            "required": ["city"]
        }),
    );

    let question = "What's the weather in Lisbon right now?";
    let request =
        ResponseRequest::new("openai/gpt-5", question).with_tools(vec![weather_tool.clone()]);

    let response = client.respond(request).await?;

    let calls = response.function_calls();
    if calls.is_empty() {
        println!("Response: {}", response.output_text());
        return Ok(());
    }

    let mut input = vec![InputItem::user(question)];
    for call in &calls {
        println!("Model called {}({})", call.name, call.arguments);
        input.push(InputItem::function_call(
            &call.call_id,
            &call.name,
            &call.arguments,
        ));
        // A real application would dispatch on call.name here
        input.push(InputItem::function_call_output(
            &call.call_id,
            r#"{"temperature_c": 21, "condition": "sunny"}"#,
        ));
    }

    let followup = ResponseRequest::new("openai/gpt-5", input).with_tools(vec![weather_tool]);
    let final_response = client.respond(followup).await?;

    println!("Response: {}", final_response.output_text());

    Ok(())
}
