//! Integration tests for the MCP tools over the in-memory backend

mod common;

use common::{client_for, orders_client, seeded_bus};
use queue_inspector_core::QueueTargets;
use queue_inspector_mcp::{InspectorMcpServer, ListParams, PrintMessageParams};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ServerHandler;
use serde_json::Value;

fn unpack(result: CallToolResult) -> anyhow::Result<(String, bool)> {
    let value = serde_json::to_value(&result)?;
    let text = value["content"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("tool result has no text content"))?
        .to_string();
    Ok((text, value["isError"].as_bool().unwrap_or(false)))
}

fn list(from: Option<&str>, to: Option<&str>) -> Parameters<ListParams> {
    Parameters(ListParams::new(from, to))
}

#[test]
fn test_server_identifies_itself() {
    let server = InspectorMcpServer::new(orders_client(&seeded_bus()));

    let info = server.get_info();

    assert_eq!(info.server_info.name, "azure-servicebus-mcp");
}

#[tokio::test]
async fn test_list_messages_from_bound() -> anyhow::Result<()> {
    let server = InspectorMcpServer::new(orders_client(&seeded_bus()));

    let result = server
        .list_messages(list(Some("2024-05-01T11:30:00Z"), None))
        .await?;

    let (text, is_error) = unpack(result)?;
    assert!(!is_error);
    let parsed: Value = serde_json::from_str(&text)?;
    let sequences: Vec<i64> = parsed
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|m| m["sequenceNumber"].as_i64())
        .collect();
    assert_eq!(sequences, vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_list_dead_letters() -> anyhow::Result<()> {
    let server = InspectorMcpServer::new(orders_client(&seeded_bus()));

    let result = server.list_dead_letters(list(None, None)).await?;

    let (text, is_error) = unpack(result)?;
    assert!(!is_error);
    let parsed: Value = serde_json::from_str(&text)?;
    assert_eq!(parsed[0]["enqueuedTime"], "2024-05-01T11:30:00Z");
    Ok(())
}

#[tokio::test]
async fn test_print_dead_letter_message() -> anyhow::Result<()> {
    let server = InspectorMcpServer::new(orders_client(&seeded_bus()));

    let result = server
        .print_message(Parameters(PrintMessageParams::new(1.0, true)))
        .await?;

    let (text, is_error) = unpack(result)?;
    assert!(!is_error);
    let parsed: Value = serde_json::from_str(&text)?;
    assert_eq!(parsed["body"], "poison");
    Ok(())
}

#[tokio::test]
async fn test_print_unknown_message_is_tool_error() -> anyhow::Result<()> {
    let server = InspectorMcpServer::new(orders_client(&seeded_bus()));

    let result = server
        .print_message(Parameters(PrintMessageParams::new(12.0, false)))
        .await?;

    let (text, is_error) = unpack(result)?;
    assert!(is_error);
    assert_eq!(text, "failed to fetch message: message 12 not found");
    Ok(())
}

#[tokio::test]
async fn test_unconfigured_dead_letter_queue() -> anyhow::Result<()> {
    let bus = seeded_bus();
    let server = InspectorMcpServer::new(client_for(&bus, QueueTargets::default()));

    let result = server.list_dead_letters(list(None, None)).await?;

    let (text, is_error) = unpack(result)?;
    assert!(is_error);
    assert_eq!(text, "failed to list dead-letter messages: no DLQ configured");
    assert_eq!(bus.open_receivers(), 0);
    Ok(())
}
