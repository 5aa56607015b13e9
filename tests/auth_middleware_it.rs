// crates.io
use httpmock::prelude::*;
use time::macros;
// self
use impact_stack_rest::{
	_preludet::*,
	auth::{AuthClient, AuthMiddleware, Token},
	error::ConfigError,
	factory::ClientFactory,
	rest::RequestOptions,
};

const TOKEN_PATH: &str = "/api/auth/v1/token";
const RENEW_PATH: &str = "/api/auth/v1/renew";
const ANSWER_PATH: &str = "/api/test/v42/answer";

fn initial_time() -> OffsetDateTime {
	macros::datetime!(2023-09-26 13:07 UTC)
}

fn token_body(token: &str, exp: OffsetDateTime) -> String {
	serde_json::json!({ "token": token, "exp": exp.unix_timestamp() }).to_string()
}

#[tokio::test]
async fn auth_client_posts_api_key_to_token_endpoint() {
	let server = MockServer::start_async().await;
	let factory = ClientFactory::new(test_config(&server.base_url(), Some("api-key")))
		.expect("Factory should build from the test config.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).body("\"api-key\"");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("TOKEN.org1", OffsetDateTime::now_utc() + Duration::hours(1)));
		})
		.await;
	let body: serde_json::Value = factory
		.get_client("auth", None)
		.expect("Auth client should build.")
		.post_json("token", RequestOptions::new().json("api-key"))
		.await
		.expect("Token request should succeed.");

	assert_eq!(body["token"], "TOKEN.org1");

	mock.assert_calls_async(1).await;

	let token = factory
		.auth_middleware()
		.auth_client()
		.get_token()
		.await
		.expect("Typed token request should succeed.");

	assert_eq!(token.secret.expose(), "TOKEN.org1");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn token_is_cached_until_half_its_lifetime_is_left() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::at(initial_time());
	let factory = build_test_factory(test_config(&server.base_url(), Some("api-key")), &clock);
	let client = factory.app_to_app("test", "v42").expect("Authenticated client should build.");
	let mut token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("TOKEN.org1", initial_time() + Duration::hours(1)));
		})
		.await;
	let first_answer = server
		.mock_async(|when, then| {
			when.method(GET).path(ANSWER_PATH).header("authorization", "Bearer TOKEN.org1");
			then.status(200).header("content-type", "application/json").body("{\"answer\":42}");
		})
		.await;
	let answer: serde_json::Value =
		client.get_json("answer", RequestOptions::new()).await.expect("First call should work.");

	assert_eq!(answer["answer"], 42);

	token_mock.assert_calls_async(1).await;
	first_answer.assert_calls_async(1).await;

	// More than half of the lifetime is left: the cached token is reused.
	clock.set(initial_time() + Duration::seconds(1799));
	client.get("answer", RequestOptions::new()).await.expect("Second call should work.");
	token_mock.assert_calls_async(1).await;
	first_answer.assert_calls_async(2).await;

	// Less than half is left: a new token is fetched and used.
	token_mock.delete_async().await;
	token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("TOKEN.org2", initial_time() + Duration::hours(2)));
		})
		.await;

	let second_answer = server
		.mock_async(|when, then| {
			when.method(GET).path(ANSWER_PATH).header("authorization", "Bearer TOKEN.org2");
			then.status(200).header("content-type", "application/json").body("{\"answer\":43}");
		})
		.await;

	clock.set(initial_time() + Duration::seconds(1801));

	let answer: serde_json::Value =
		client.get_json("answer", RequestOptions::new()).await.expect("Third call should work.");

	assert_eq!(answer["answer"], 43);

	token_mock.assert_calls_async(1).await;
	second_answer.assert_calls_async(1).await;
	first_answer.assert_calls_async(2).await;

	let cached = factory.auth_middleware().cached_token().expect("Renewed token is cached.");

	assert_eq!(cached.secret.expose(), "TOKEN.org2");
	assert_eq!(cached.issued_at, initial_time() + Duration::seconds(1801));
}

#[tokio::test]
async fn fetch_failures_propagate_and_skip_the_request() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::at(initial_time());
	let factory = build_test_factory(test_config(&server.base_url(), Some("bad-key")), &clock);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(403).body("invalid api key");
		})
		.await;
	let answer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ANSWER_PATH);
			then.status(200);
		})
		.await;
	let err = factory
		.app_to_app("test", "v42")
		.expect("Authenticated client should build.")
		.get("answer", RequestOptions::new())
		.await
		.expect_err("Token failures must fail the signed request.");

	assert_eq!(err.status(), Some(403));
	assert!(factory.auth_middleware().cached_token().is_none());

	token_mock.assert_calls_async(1).await;
	answer_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_requests_share_one_fetch() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::at(initial_time());
	let factory = build_test_factory(test_config(&server.base_url(), Some("api-key")), &clock);
	let client = factory.app_to_app("test", "v42").expect("Authenticated client should build.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("TOKEN.shared", initial_time() + Duration::hours(1)))
				.delay(std::time::Duration::from_millis(100));
		})
		.await;
	let answer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ANSWER_PATH).header("authorization", "Bearer TOKEN.shared");
			then.status(200);
		})
		.await;
	let (first, second) = tokio::join!(
		client.get("answer", RequestOptions::new()),
		client.get("answer", RequestOptions::new()),
	);

	first.expect("First concurrent call should succeed.");
	second.expect("Second concurrent call should succeed.");

	token_mock.assert_calls_async(1).await;
	answer_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn auth_endpoints_work_without_api_key() {
	let server = MockServer::start_async().await;
	let factory = ClientFactory::new(test_config(&server.base_url(), None))
		.expect("Factory should build without an API key.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEW_PATH);
			then.status(200).header("content-type", "application/json").body("{\"status\":\"ok\"}");
		})
		.await;
	let body: serde_json::Value = factory
		.get_client("auth", None)
		.expect("Auth client should build.")
		.post_json("renew", RequestOptions::new())
		.await
		.expect("Renew call should succeed.");

	assert_eq!(body["status"], "ok");

	mock.assert_async().await;
}

#[tokio::test]
async fn seeded_tokens_are_renewed_without_api_key() {
	let server = MockServer::start_async().await;
	let config = test_config(&server.base_url(), None);
	let clock = ManualClock::at(initial_time() + Duration::minutes(45));
	let http = ReqwestClient::new();
	let middleware = AuthMiddleware::new(
		AuthClient::from_config(&config, http.clone()).expect("Auth client should build."),
	)
	.with_clock(Arc::new(clock.clone()))
	.with_token(Token::new("SESSION.old", initial_time(), initial_time() + Duration::hours(1)));
	let factory = ClientFactory::with_auth_middleware(config, http, middleware);
	let renew_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(RENEW_PATH).header("authorization", "Bearer SESSION.old");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("SESSION.new", initial_time() + Duration::minutes(105)));
		})
		.await;
	let answer_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(ANSWER_PATH).header("authorization", "Bearer SESSION.new");
			then.status(200);
		})
		.await;

	factory
		.app_to_app("test", "v42")
		.expect("Authenticated client should build.")
		.get("answer", RequestOptions::new())
		.await
		.expect("Renewed session token should sign the request.");

	renew_mock.assert_calls_async(1).await;
	answer_mock.assert_calls_async(1).await;

	factory.auth_middleware().invalidate();

	let err = factory
		.auth_middleware()
		.token()
		.await
		.expect_err("Without an API key nothing is left to renew from.");

	assert!(matches!(err, Error::Config(ConfigError::MissingApiKey)));
}

#[tokio::test]
async fn tokens_without_expiry_are_rejected() {
	let server = MockServer::start_async().await;
	let factory = ClientFactory::new(test_config(&server.base_url(), Some("api-key")))
		.expect("Factory should build from the test config.");

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body("{\"status\":\"ok\"}");
		})
		.await;

	let err = factory
		.auth_middleware()
		.token()
		.await
		.expect_err("A token response without a token must fail.");

	assert!(matches!(err, Error::MalformedResponse(_)));
}
