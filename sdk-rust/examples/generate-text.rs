use dotenvy::dotenv;
use responses_dsl::{Client, ClientOptions, ConfigParameter, Message, Request, ResponsesApi};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let client = Client::new(ClientOptions::from_env()).unwrap();

    let request = Request::new(
        "gpt-4o",
        vec![
            Message::system("You are a helpful assistant. Keep answers short."),
            Message::user("Tell me a story."),
            Message::assistant("What kind of story would you like to hear?"),
            Message::user("A fairy tale."),
        ],
        vec![
            ConfigParameter::temperature(0.7).unwrap(),
            ConfigParameter::max_output_tokens(300).unwrap(),
        ],
    )
    .unwrap();

    let response = client.send(&request).await.unwrap();

    println!("{response:#?}");
    println!("{}", response.output_text());
}
