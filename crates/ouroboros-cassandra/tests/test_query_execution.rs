//! Integration tests for terminal builder operations against an in-memory transport.

mod common;

use common::{rows, session, RecordingTransport};
use ouroboros_cassandra::{
    CollectionOperation, CollectionValue, CqlType, CqlValue, DataBridgeError, Operator,
    PagingState, Session, SessionConfig,
};
use serde_json::json;

#[tokio::test]
async fn test_get_sends_compiled_select_and_bindings() {
    let transport = RecordingTransport::with_pages(vec![rows(1, 2)]);
    let result = session(&transport)
        .table("users")
        .unwrap()
        .where_clause("id", Operator::Eq, 42)
        .unwrap()
        .get(&["name"])
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    let sent = transport.last();
    assert_eq!(sent.cql, "select name from users where id = ?");
    assert_eq!(sent.options.arguments, vec![CqlValue::Int(42)]);
    assert!(!sent.asynchronous);
}

#[tokio::test]
async fn test_first_adds_limit() {
    let transport = RecordingTransport::with_pages(vec![rows(7, 1)]);
    let row = session(&transport)
        .table("users")
        .unwrap()
        .first(&["*"])
        .await
        .unwrap()
        .unwrap();

    assert_eq!(row.get("id").unwrap(), &CqlValue::Int(7));
    assert_eq!(transport.last().cql, "select * from users limit 1");
}

#[tokio::test]
async fn test_update_collection_scenario() {
    let transport = RecordingTransport::new();
    let tags = CollectionValue::set(CqlType::Text, ["a", "b"]).unwrap();
    session(&transport)
        .table("users")
        .unwrap()
        .replace_collection("tags", tags.clone())
        .unwrap()
        .where_eq("id", 1)
        .unwrap()
        .update(vec![])
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(sent.cql, "update users set tags = ? where id = ?");
    assert_eq!(
        sent.options.arguments,
        vec![CqlValue::Collection(tags), CqlValue::Int(1)]
    );
}

#[tokio::test]
async fn test_update_appends_and_assigns() {
    let transport = RecordingTransport::new();
    let scores = CollectionValue::map(CqlType::Text, CqlType::Int, [("math", 90)]).unwrap();
    session(&transport)
        .table("students")
        .unwrap()
        .update_collection("scores", Some(CollectionOperation::Append), scores.clone())
        .unwrap()
        .where_eq("id", 3)
        .unwrap()
        .update(vec![("name".to_string(), CqlValue::from("Ann"))])
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(
        sent.cql,
        "update students set scores = scores + ?, name = ? where id = ?"
    );
    assert_eq!(
        sent.options.arguments,
        vec![
            CqlValue::Collection(scores),
            CqlValue::from("Ann"),
            CqlValue::Int(3),
        ]
    );
}

#[tokio::test]
async fn test_empty_insert_sends_nothing() {
    let transport = RecordingTransport::new();
    let inserted = session(&transport)
        .table("users")
        .unwrap()
        .insert(Vec::<(String, CqlValue)>::new())
        .await
        .unwrap();

    assert!(inserted);
    assert!(transport.recorded().is_empty());

    let page = session(&transport)
        .table("users")
        .unwrap()
        .insert_async(Vec::<Vec<(String, CqlValue)>>::new())
        .unwrap()
        .await
        .unwrap();
    assert!(page.is_last_page());
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn test_batch_insert() {
    let transport = RecordingTransport::new();
    session(&transport)
        .table("users")
        .unwrap()
        .insert(vec![
            vec![("name", CqlValue::from("Alice")), ("id", CqlValue::Int(1))],
            vec![("name", CqlValue::from("Bob")), ("id", CqlValue::Int(2))],
        ])
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(sent.cql, "insert into users (id, name) values (?, ?), (?, ?)");
    assert_eq!(
        sent.options.arguments,
        vec![
            CqlValue::Int(1),
            CqlValue::from("Alice"),
            CqlValue::Int(2),
            CqlValue::from("Bob"),
        ]
    );
}

#[tokio::test]
async fn test_insert_async_dispatches() {
    let transport = RecordingTransport::new();
    let future = session(&transport)
        .table("users")
        .unwrap()
        .insert_async(vec![("id", CqlValue::Int(1))])
        .unwrap();

    assert!(transport.last().asynchronous);
    future.await.unwrap();
}

#[tokio::test]
async fn test_deletes_are_asynchronous() {
    let transport = RecordingTransport::new();
    let s = session(&transport);

    // Dropping the future is fire-and-forget; the statement was already handed over
    drop(
        s.table("users")
            .unwrap()
            .where_eq("id", 1)
            .unwrap()
            .delete_row()
            .unwrap(),
    );
    let sent = transport.last();
    assert_eq!(sent.cql, "delete from users where id = ?");
    assert!(sent.asynchronous);

    s.table("users")
        .unwrap()
        .where_eq("id", 1)
        .unwrap()
        .delete_column(&["email"])
        .unwrap()
        .await
        .unwrap();
    let sent = transport.last();
    assert_eq!(sent.cql, "delete email from users where id = ?");
    assert_eq!(sent.options.arguments, vec![CqlValue::Int(1)]);
    assert!(sent.asynchronous);
}

#[tokio::test]
async fn test_get_async() {
    let transport = RecordingTransport::with_pages(vec![rows(1, 3)]);
    let page = session(&transport)
        .table("users")
        .unwrap()
        .get_async(&["id"])
        .unwrap()
        .await
        .unwrap();
    assert_eq!(page.count(), 3);
    assert!(transport.last().asynchronous);
}

#[tokio::test]
async fn test_index_has_no_arguments() {
    let transport = RecordingTransport::new();
    session(&transport)
        .table("users")
        .unwrap()
        .where_eq("id", 1)
        .unwrap()
        .index(&["email"])
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(sent.cql, "CREATE INDEX IF NOT EXISTS ON users(email)");
    assert!(sent.options.arguments.is_empty());
}

#[tokio::test]
async fn test_passthrough_options_and_session_defaults() {
    let transport = RecordingTransport::new();
    let config =
        SessionConfig::from_json_str(r#"{"default_options": {"consistency": "LOCAL_ONE"}}"#)
            .unwrap();
    let s = Session::with_config(transport.clone(), config).unwrap();

    s.table("users").unwrap().get(&["*"]).await.unwrap();
    assert_eq!(
        transport.last().options.passthrough.get("consistency"),
        Some(&json!("LOCAL_ONE"))
    );

    let mut options = serde_json::Map::new();
    options.insert("consistency".to_string(), json!("QUORUM"));
    s.table("users")
        .unwrap()
        .with_options(options)
        .get(&["*"])
        .await
        .unwrap();
    assert_eq!(
        transport.last().options.to_json(),
        json!({"consistency": "QUORUM", "arguments": []})
    );
}

#[tokio::test]
async fn test_paginate_options() {
    let transport = RecordingTransport::with_pages(vec![rows(1, 2), rows(3, 2)]);
    let s = session(&transport);

    let first = s
        .table("users")
        .unwrap()
        .where_eq("tenant", "x")
        .unwrap()
        .paginate(Some(2), &["id"], None)
        .await
        .unwrap();
    let sent = transport.last();
    assert_eq!(sent.cql, "select id from users where tenant = ?");
    assert_eq!(sent.options.page_size, Some(2));
    assert!(sent.options.paging_state.is_none());
    assert!(!first.is_last_page());

    let cursor: PagingState = first.paging_state().cloned().unwrap();
    let second = s
        .table("users")
        .unwrap()
        .where_eq("tenant", "x")
        .unwrap()
        .paginate(None, &["id"], Some(cursor))
        .await
        .unwrap();
    let sent = transport.last();
    assert_eq!(sent.options.page_size, Some(15));
    assert_eq!(
        sent.options.to_json()["paging_state_token"],
        json!("01")
    );
    assert!(second.is_last_page());
    assert_eq!(second.rows()[0].get("id").unwrap(), &CqlValue::Int(3));
}

#[tokio::test]
async fn test_transport_errors_pass_through() {
    let transport = RecordingTransport::failing(DataBridgeError::Unavailable(
        "not enough replicas".to_string(),
    ));
    let err = session(&transport)
        .table("users")
        .unwrap()
        .get(&["*"])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DataBridgeError::Unavailable("not enough replicas".to_string())
    );
    assert!(err.is_transport());
    assert_eq!(transport.recorded().len(), 1);
}

#[tokio::test]
async fn test_configuration_errors_send_nothing() {
    let transport = RecordingTransport::new();
    let err = session(&transport)
        .table("users")
        .unwrap()
        .update_collection("tags", None, 5)
        .unwrap_err();

    assert!(matches!(err, DataBridgeError::InvalidBindingType(_)));
    assert!(transport.recorded().is_empty());
}

/// Implements only `execute`, relying on the default `execute_async`.
struct ExecuteOnlyTransport {
    sent: tokio::sync::mpsc::UnboundedSender<String>,
}

#[async_trait::async_trait]
impl ouroboros_cassandra::Transport for ExecuteOnlyTransport {
    async fn execute(
        &self,
        cql: &str,
        _options: ouroboros_cassandra::ExecutionOptions,
    ) -> ouroboros_cassandra::Result<ouroboros_cassandra::ResultPage> {
        let _ = self.sent.send(cql.to_string());
        Ok(ouroboros_cassandra::ResultPage::empty())
    }
}

#[tokio::test]
async fn test_dropped_delete_is_sent_by_default_transport() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let s = Session::new(std::sync::Arc::new(ExecuteOnlyTransport { sent: tx }));

    drop(
        s.table("users")
            .unwrap()
            .where_eq("id", 1)
            .unwrap()
            .delete_row()
            .unwrap(),
    );

    let cql = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
        .await
        .expect("delete was never sent")
        .unwrap();
    assert_eq!(cql, "delete from users where id = ?");
}

#[tokio::test]
async fn test_default_execute_async_resolves_to_page() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let s = Session::new(std::sync::Arc::new(ExecuteOnlyTransport { sent: tx }));

    let page = s
        .table("users")
        .unwrap()
        .get_async(&["id"])
        .unwrap()
        .await
        .unwrap();
    assert!(page.is_last_page());
    assert_eq!(rx.recv().await.unwrap(), "select id from users");
}
