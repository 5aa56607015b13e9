//! Demonstrates a factory-built service client that fetches a JWT on the first call and reuses
//! it for the next one, all against a local mock of the Impact Stack API.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use impact_stack_rest::{
	config::{API_KEY_KEY, API_URL_KEY, ClientConfig},
	factory::ClientFactory,
	rest::RequestOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let exp = (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp();
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/v1/token").body("\"demo-key\"");
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"token\":\"demo-jwt\",\"exp\":{exp}}}"));
		})
		.await;
	let answer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/test/v42/answer").header("authorization", "Bearer demo-jwt");
			then.status(200).header("content-type", "application/json").body("{\"answer\":42}");
		})
		.await;
	let api_url = format!("{}/api", server.base_url());
	let config = ClientConfig::from_vars([(API_URL_KEY, api_url.as_str()), (API_KEY_KEY, "demo-key")])?
		.with_default_version("test", "v42");
	let factory = ClientFactory::new(config)?;
	let client = factory.get_client("test", None)?;

	for _ in 0..2 {
		let answer: serde_json::Value = client.get_json("answer", RequestOptions::new()).await?;

		println!("The answer is {}.", answer["answer"]);
	}

	token_mock.assert_calls_async(1).await;
	answer_mock.assert_calls_async(2).await;

	Ok(())
}
