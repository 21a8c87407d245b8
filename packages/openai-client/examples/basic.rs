//! Basic chat completion against OpenAI or Groq.
//!
//! Run with:
//!   OPENAI_API_KEY=sk-... cargo run -p openai-client --example basic

use openai_client::{ChatRequest, Message, OpenAIClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAIClient::from_env()?;

    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o")
                .message(Message::system("You are a market research assistant."))
                .message(Message::user("Name the largest segments of the tea industry."))
                .temperature(0.2)
                .token_limit(300),
        )
        .await?;

    println!("Response: {}", response.content);
    if let Some(usage) = response.usage {
        println!("Tokens used: {}", usage.total_tokens);
    }

    Ok(())
}
