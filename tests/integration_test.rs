/// End-to-end tests: export file → load → index → query
mod common;

use chatgpt_history::mcp::{McpServer, serve};
use chatgpt_history::shared::format::{format_conversation, format_search_results};
use chatgpt_history::shared::{Config, LoadError, Role, SearchEngine, SearchQuery, load};
use common::{ConversationBuilder, ExportBuilder, ranking_export};
use serde_json::{Value, json};

fn ids(hits: &[chatgpt_history::SearchHit<'_>]) -> Vec<String> {
    hits.iter().map(|h| h.conversation.id.clone()).collect()
}

#[test]
fn test_e2e_zip_and_json_exports_load_identically() {
    let (_zip_dir, zip_path) = ranking_export().write_zip();
    let (_json_dir, json_path) = ranking_export().write_json();

    let from_zip = load(&zip_path).expect("zip export should load");
    let from_json = load(&json_path).expect("json export should load");

    assert_eq!(from_zip.len(), 3);
    assert_eq!(from_zip, from_json);

    // Newest first
    let order: Vec<_> = from_zip.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(order, vec!["c3", "c2", "c1"]);

    let c1 = from_zip.iter().find(|c| c.id == "c1").unwrap();
    assert_eq!(c1.messages.len(), 2);
    assert_eq!(c1.messages[0].role, Role::User);
    assert_eq!(c1.messages[0].text, "fix this python error");
    assert_eq!(c1.model_slug, "gpt-4o");
}

#[test]
fn test_e2e_ranking() {
    let (_dir, path) = ranking_export().write_json();
    let engine = SearchEngine::load(&path).unwrap();

    let hits = engine.search(&SearchQuery::new("python", 10));
    assert_eq!(ids(&hits), vec!["c1", "c3"]);
    assert!(hits[0].score > hits[1].score);

    let phrase = engine.search(&SearchQuery::new("Python debugging", 10));
    assert_eq!(phrase[0].conversation.id, "c1");

    assert!(engine.search(&SearchQuery::new("", 10)).is_empty());
    assert!(engine.search(&SearchQuery::new("!!!", 10)).is_empty());
}

#[test]
fn test_e2e_date_filtered_search() {
    let (_dir, path) = ranking_export().write_zip();
    let engine = SearchEngine::load(&path).unwrap();

    let query = SearchQuery {
        date_from: Some("2024-02-15".to_string()),
        ..SearchQuery::new("python", 10)
    };
    assert_eq!(ids(&engine.search(&query)), vec!["c3"]);

    // An unparsable bound is ignored
    let query = SearchQuery {
        date_from: Some("last tuesday".to_string()),
        ..SearchQuery::new("python", 10)
    };
    assert_eq!(engine.search(&query).len(), 2);
}

#[test]
fn test_e2e_empty_conversations_dropped() {
    let kept = ConversationBuilder::new("kept")
        .title("Kept")
        .created(2.0)
        .user("hello");
    let empty = ConversationBuilder::new("empty")
        .title("Nothing said")
        .created(3.0);
    let blank = ConversationBuilder::new("blank")
        .created(4.0)
        .user("   ")
        .message("critic", "unknown role");
    let (_dir, path) = ExportBuilder::new()
        .with(kept)
        .with(empty)
        .with(blank)
        .write_json();

    let engine = SearchEngine::load(&path).unwrap();
    assert_eq!(engine.len(), 1);
    assert!(engine.find_by_id("kept").is_some());
    assert!(engine.find_by_id("empty").is_none());
    assert!(engine.find_by_id("blank").is_none());
}

#[test]
fn test_e2e_flat_messages_fallback() {
    let (_dir, path) = ExportBuilder::new()
        .with_raw(json!({
            "conversation_id": "flat",
            "title": "Flat export",
            "create_time": 1_704_067_200.0,
            "messages": [
                { "role": "user", "content": "what is a monad" },
                {
                    "author": { "role": "assistant" },
                    "content": { "parts": ["a monoid in the category of endofunctors"] }
                }
            ]
        }))
        .write_json();

    let engine = SearchEngine::load(&path).unwrap();
    let conv = engine.find_by_id("flat").unwrap();
    assert_eq!(conv.messages.len(), 2);
    assert_eq!(conv.messages[1].role, Role::Assistant);

    let hits = engine.search(&SearchQuery::new("endofunctors", 5));
    assert_eq!(ids(&hits), vec!["flat"]);
}

#[test]
fn test_e2e_pagination() {
    let builder = (0..5).fold(ExportBuilder::new(), |b, i| {
        b.with(
            ConversationBuilder::new(&format!("conv-{i}"))
                .title(&format!("Conversation {i}"))
                .created(1_700_000_000.0 + i as f64)
                .user("hi"),
        )
    });
    let (_dir, path) = builder.write_json();
    let engine = SearchEngine::load(&path).unwrap();

    let (page, total) = engine.list_page(0, 2);
    assert_eq!(total, 5);
    let page_ids: Vec<_> = page.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(page_ids, vec!["conv-4", "conv-3"]);

    let (page, _) = engine.list_page(4, 2);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "conv-0");

    let (page, total) = engine.list_page(10, 2);
    assert!(page.is_empty());
    assert_eq!(total, 5);
}

#[test]
fn test_e2e_formatting_from_loaded_export() {
    let (_dir, path) = ranking_export().write_zip();
    let engine = SearchEngine::load(&path).unwrap();

    let hits = engine.search(&SearchQuery::new("launch", 10));
    let rendered = format_search_results("launch", &hits, 200);
    assert!(rendered.contains("### 1. Marketing plan"));
    assert!(rendered.contains("- **Model**: gpt-4"));

    let transcript = format_conversation(engine.find_by_id("c1").unwrap(), None);
    assert!(transcript.contains("fix this python error"));
    assert!(transcript.contains("Check the traceback first."));
}

#[test]
fn test_e2e_load_errors() {
    let (dir, _) = ranking_export().write_json();

    let txt = dir.path().join("conversations.txt");
    std::fs::write(&txt, "[]").unwrap();
    assert!(matches!(load(&txt), Err(LoadError::UnsupportedFormat(_))));

    let missing = dir.path().join("absent.json");
    assert!(matches!(load(&missing), Err(LoadError::Io { .. })));

    let not_array = dir.path().join("object.json");
    std::fs::write(&not_array, r#"{"conversations": []}"#).unwrap();
    let result = load(&not_array);
    assert!(matches!(result, Err(LoadError::UnexpectedShape(_))));
}

#[tokio::test]
async fn test_e2e_mcp_session() {
    let (_dir, path) = ranking_export().write_zip();
    let engine = SearchEngine::load(&path).unwrap();
    let mut server = McpServer::new(engine, path, Config::default());

    let call = |id: u64, name: &str, arguments: Value| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        })
    };
    let search = json!({ "query": "python", "limit": 1 });
    let get = json!({ "conversation_id": "c3" });
    let requests = [
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        call(2, "chatgpt_search", search),
        call(3, "chatgpt_get_conversation", get),
        call(4, "chatgpt_reload", json!({})),
    ];
    let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
    let mut output = Vec::new();

    serve(&mut server, input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let search_text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(search_text.contains("Found 1 conversation(s)"));
    assert!(search_text.contains("Python debugging tips"));

    let conv_text = responses[2]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(conv_text.starts_with("## Marketing plan"));

    let reload_text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
    assert!(reload_text.starts_with("Reloaded 3 conversations"));
    assert_eq!(server.engine().len(), 3);
}
