use spotify_api::{Client, Request, SpotifyApiError, endpoints::TimeRange};

#[tokio::main]
pub async fn main() -> Result<(), SpotifyApiError> {
    let client = Client::new("access_token");

    let req = Request::top()
        .artists()
        .limit(5u32)
        .time_range(TimeRange::MediumTerm);

    let res = client.send(req).await?;
    for artist in res.items {
        println!("{}", artist.name);
    }
    Ok(())
}
