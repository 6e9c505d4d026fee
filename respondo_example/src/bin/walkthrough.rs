use anyhow::Result;
use respondo::{
    InputItem, Responder, ResponseProvider, ResponseRequest, StreamEvent, TextConfig, Tool,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    println!("Respondo - Client Walkthrough");
    println!("=============================\n");

    let model = std::env::var("RESPONDO_MODEL").unwrap_or_else(|_| "openai/gpt-5".to_string());

    // 1. Build the client from OPENROUTER_API_KEY
    println!("1. Creating client...");
    let client = Responder::from_env()?;
    println!("   ✓ Ready\n");

    // 2. One-shot request
    println!("2. Non-streaming request...");
    let response = client
        .respond(ResponseRequest::new(&model, "In one sentence, what is Rust?"))
        .await?;
    println!("   ✓ {}\n", response.output_text());

    // 3. Streaming request
    println!("3. Streaming request...");
    print!("   ");
    let mut stream = client
        .respond_stream(ResponseRequest::new(
            &model,
            "Count from 1 to 5, words only.",
        ))
        .await?;

    while let Some(event) = stream.next_event().await {
        match event? {
            StreamEvent::TextDelta { delta, .. } => {
                print!("{}", delta);
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            StreamEvent::Completed { response } => {
                println!();
                if let Some(usage) = &response.usage {
                    println!("   ✓ {} tokens total\n", usage.total_tokens);
                }
            }
            _ => {}
        }
    }

    // 4. Tool-call round trip
    println!("4. Tool calls...");
    let clock_tool = Tool::function(
        "current_time",
        "Current UTC time as an ISO 8601 string",
        json!({"type": "object", "properties": {}}),
    );
    let question = "What time is it in UTC?";
    let first = client
        .respond(ResponseRequest::new(&model, question).with_tools(vec![clock_tool.clone()]))
        .await?;

    let calls = first.function_calls();
    if calls.is_empty() {
        println!("   Model answered without the tool: {}\n", first.output_text());
    } else {
        let mut input = vec![InputItem::user(question)];
        for call in &calls {
            println!("   Model called {}({})", call.name, call.arguments);
            input.push(InputItem::function_call(
                &call.call_id,
                &call.name,
                &call.arguments,
            ));
            input.push(InputItem::function_call_output(
                &call.call_id,
                r#""2026-08-26T12:00:00Z""#,
            ));
        }

        let second = client
            .respond(ResponseRequest::new(&model, input).with_tools(vec![clock_tool]))
            .await?;
        println!("   ✓ {}\n", second.output_text());
    }

    // 5. JSON output
    println!("5. Structured output...");
    let structured = client
        .respond(
            ResponseRequest::new(&model, "List three primary colors.")
                .with_instructions("Respond as a JSON object with a \"colors\" array.")
                .with_text_format(TextConfig::json_object()),
        )
        .await?;

    match structured.output_json() {
        Some(value) => println!("   ✓ {}", value),
        None => println!("   Output was not valid JSON: {}", structured.output_text()),
    }

    println!("\n=============================");
    println!("Walkthrough completed!");

    Ok(())
}
