use askagent::agent::{
    AgentLoop, CompletionClient, LoopOutcome, Message, OpenAiClient, ERROR_ANSWER_PREFIX,
    EXHAUSTED_MESSAGE,
};
use askagent::config::{Config, LlmConfig, SearchConfig};
use askagent::tools::{ToolCall, ToolRegistry, SEARCH_ERROR_PREFIX};
use askagent::Error;
use secrecy::SecretString;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_key: SecretString::from("test-key"),
        base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    }
}

fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig {
        api_key: Some(SecretString::from("tvly-test")),
        base_url: server.uri(),
        ..Default::default()
    }
}

fn text_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

fn search_call_body(call_id: &str, query: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": call_id,
                    "type": "function",
                    "function": {
                        "name": "tavily_search",
                        "arguments": json!({ "query": query }).to_string()
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 15, "completion_tokens": 8, "total_tokens": 23 }
    })
}

fn tavily_body() -> Value {
    json!({
        "query": "capital of France",
        "results": [
            { "title": "Paris", "url": "https://en.wikipedia.org/wiki/Paris", "content": "Paris is the capital of France." },
            { "title": "France", "url": "https://en.wikipedia.org/wiki/France", "content": "France is a country in Europe." }
        ]
    })
}

fn search_call(query: &str) -> ToolCall {
    ToolCall {
        id: "call_1".to_string(),
        name: "tavily_search".to_string(),
        arguments: json!({ "query": query }),
    }
}

// ---- Completion client ----

#[tokio::test]
async fn test_text_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hello!")))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    let completion = client.complete(&[Message::user("Hi")], &[]).await.unwrap();

    assert!(completion.is_final());
    assert_eq!(completion.content, "Hello!");
    assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    assert_eq!(completion.usage.unwrap().total_tokens, 15);
}

#[tokio::test]
async fn test_tool_call_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_call_body("call_abc", "rust 2024")),
        )
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    let completion = client.complete(&[Message::user("news?")], &[]).await.unwrap();

    assert!(!completion.is_final());
    assert_eq!(completion.content, "");
    assert_eq!(completion.tool_calls.len(), 1);
    assert_eq!(completion.tool_calls[0].id, "call_abc");
    assert_eq!(completion.tool_calls[0].name, "tavily_search");
    assert_eq!(completion.tool_calls[0].arguments, json!({ "query": "rust 2024" }));
}

#[tokio::test]
async fn test_request_omits_tools_when_catalog_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("ok")))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    client.complete(&[Message::user("Hi")], &[]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    let err = client.complete(&[Message::user("Hi")], &[]).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[tokio::test]
async fn test_rate_limit_maps_to_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    let err = client.complete(&[Message::user("Hi")], &[]).await.unwrap_err();
    assert!(matches!(err, Error::RateLimit(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_maps_to_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(llm_config(&server)).unwrap();
    let err = client.complete(&[Message::user("Hi")], &[]).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ref msg) if msg.contains("boom")));
}

// ---- Search tool ----

#[tokio::test]
async fn test_search_formats_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "capital of France",
            "max_results": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(1)
        .mount(&server)
        .await;

    let registry = ToolRegistry::from_config(&search_config(&server));
    let output = registry.invoke(&search_call("capital of France")).await;

    assert!(output.starts_with("1. **Paris**\n   URL: https://en.wikipedia.org/wiki/Paris\n"));
    assert!(output.contains("2. **France**"));
    assert!(output.contains("Paris is the capital of France."));
}

#[tokio::test]
async fn test_search_with_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let registry = ToolRegistry::from_config(&search_config(&server));
    let output = registry.invoke(&search_call("zzzz")).await;
    assert_eq!(output, "No results found for the query.");
}

#[tokio::test]
async fn test_search_caps_results_at_max() {
    let server = MockServer::start().await;

    let results: Vec<Value> = (1..=8)
        .map(|i| {
            json!({
                "title": format!("Result {}", i),
                "url": format!("https://example.com/{}", i),
                "content": format!("Snippet {}", i)
            })
        })
        .collect();

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(&server)
        .await;

    let registry = ToolRegistry::from_config(&search_config(&server));
    let output = registry.invoke(&search_call("many")).await;

    assert!(output.contains("5. **Result 5**"));
    assert!(!output.contains("6. **"));
    assert!(!output.contains("Result 6"));
}

#[tokio::test]
async fn test_search_keeps_results_without_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "title": "Paris", "url": "https://en.wikipedia.org/wiki/Paris", "content": "Capital of France." },
                { "title": "Unlinked", "content": "A result with no url." }
            ]
        })))
        .mount(&server)
        .await;

    let registry = ToolRegistry::from_config(&search_config(&server));
    let output = registry.invoke(&search_call("capital of France")).await;

    assert!(!output.starts_with(SEARCH_ERROR_PREFIX));
    assert!(output.contains("1. **Paris**"));
    assert!(output.contains("2. **Unlinked**"));
    assert!(output.contains("A result with no url."));
}

#[tokio::test]
async fn test_search_failure_is_returned_as_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let registry = ToolRegistry::from_config(&search_config(&server));
    let output = registry.invoke(&search_call("anything")).await;
    assert!(output.starts_with(SEARCH_ERROR_PREFIX));
    assert!(output.contains("upstream down"));
    assert!(!output.contains("Provider error"));
}

// ---- Agent loop, end to end ----

fn config_for(llm: &MockServer, search: Option<&MockServer>) -> Config {
    let mut config = Config::default();
    config.llm = llm_config(llm);
    if let Some(search) = search {
        config.search = search_config(search);
    }
    config
}

#[tokio::test]
async fn test_search_then_answer() {
    let llm = MockServer::start().await;
    let tavily = MockServer::start().await;

    // First round asks for a search, the second answers
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(search_call_body("call_1", "capital of France")),
        )
        .up_to_n_times(1)
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Paris.")))
        .mount(&llm)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(1)
        .mount(&tavily)
        .await;

    let agent = AgentLoop::from_config(&config_for(&llm, Some(&tavily))).unwrap();
    let output = agent
        .run_with_callback("What is the capital of France?", &askagent::agent::NoOpCallback)
        .await;

    assert_eq!(output.response, "Paris.");
    assert_eq!(output.outcome, LoopOutcome::Completed);
    assert_eq!(output.iterations, 2);
    assert_eq!(output.tool_calls, 1);
    assert_eq!(output.total_usage.total_tokens, 38);

    let requests = llm.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let first: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(first["tool_choice"], "auto");
    assert_eq!(first["tools"][0]["function"]["name"], "tavily_search");

    // The second round carries the assistant turn and the tool result
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_call_id"], "call_1");
    assert!(messages[3]["content"].as_str().unwrap().contains("**Paris**"));
}

#[tokio::test]
async fn test_no_search_key_never_calls_search() {
    let llm = MockServer::start().await;
    let tavily = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("From memory.")))
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(0)
        .mount(&tavily)
        .await;

    let agent = AgentLoop::from_config(&config_for(&llm, None)).unwrap();
    assert!(agent.tool_definitions().is_empty());

    let answer = agent.run("Who wrote Hamlet?").await;
    assert_eq!(answer, "From memory.");

    let requests = llm.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn test_budget_exhaustion_end_to_end() {
    let llm = MockServer::start().await;
    let tavily = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_call_body("call_x", "more")))
        .expect(10)
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(10)
        .mount(&tavily)
        .await;

    let agent = AgentLoop::from_config(&config_for(&llm, Some(&tavily))).unwrap();
    let output = agent
        .run_with_callback("Keep searching", &askagent::agent::NoOpCallback)
        .await;

    assert_eq!(output.response, EXHAUSTED_MESSAGE);
    assert_eq!(output.outcome, LoopOutcome::MaxIterationsExceeded);
    assert_eq!(output.iterations, 10);
}

#[tokio::test]
async fn test_provider_failure_becomes_answer_text() {
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&llm)
        .await;

    let agent = AgentLoop::from_config(&config_for(&llm, None)).unwrap();
    let answer = agent.run("Hello?").await;

    assert!(answer.starts_with(ERROR_ANSWER_PREFIX));
    assert!(answer.contains("unavailable"));
}
