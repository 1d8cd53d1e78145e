use hostcrawl::{command_argument_builder, handle_scan};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    handle_scan(&matches).await;
}
