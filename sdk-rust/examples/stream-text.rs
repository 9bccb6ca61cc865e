use dotenvy::dotenv;
use futures::stream::StreamExt;
use responses_dsl::{
    Client, ClientOptions, Conversation, ResponseEvent, ResponsesApi, StreamAccumulator,
};
use std::io::Write;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let client = Client::new(ClientOptions::from_env()).unwrap();

    let mut conversation = Conversation::new();
    conversation
        .append_user("Tell me a story.")
        .append_assistant("What kind of story would you like to hear?")
        .append_user("A fairy tale.");

    let request = conversation.request("gpt-4o", vec![]).unwrap();
    let mut stream = client.stream(&request).await.unwrap();

    let mut accumulator = StreamAccumulator::new();

    while let Some(event) = stream.next().await {
        let event = event.unwrap();
        if let ResponseEvent::OutputTextDelta(delta) = &event {
            print!("{}", delta.delta);
            std::io::stdout().flush().ok();
        }
        accumulator.add_event(&event);
    }
    println!();

    let final_response = accumulator.into_response();
    println!("Final response: {final_response:#?}");
}
